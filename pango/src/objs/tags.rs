//! Administrative tags and their color palette.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{entry_node, expect_tag, text, Emit};
use crate::xpath::{entry_xpath, ObjectScope};

pub const COLOR_RED: &str = "color1";
pub const COLOR_GREEN: &str = "color2";
pub const COLOR_BLUE: &str = "color3";
pub const COLOR_YELLOW: &str = "color4";
pub const COLOR_COPPER: &str = "color5";
pub const COLOR_ORANGE: &str = "color6";
pub const COLOR_PURPLE: &str = "color7";
pub const COLOR_GRAY: &str = "color8";
pub const COLOR_LIGHT_GREEN: &str = "color9";
pub const COLOR_CYAN: &str = "color10";
pub const COLOR_LIGHT_GRAY: &str = "color11";
pub const COLOR_BLUE_GRAY: &str = "color12";
pub const COLOR_LIME: &str = "color13";
pub const COLOR_BLACK: &str = "color14";
pub const COLOR_GOLD: &str = "color15";
pub const COLOR_BROWN: &str = "color16";
pub const COLOR_OLIVE: &str = "color17";
// color18 does not exist on PAN-OS.
pub const COLOR_MAROON: &str = "color19";
pub const COLOR_RED_ORANGE: &str = "color20";
pub const COLOR_YELLOW_ORANGE: &str = "color21";
pub const COLOR_FOREST_GREEN: &str = "color22";
pub const COLOR_TURQUOISE_BLUE: &str = "color23";
pub const COLOR_AZURE_BLUE: &str = "color24";
pub const COLOR_CERULEAN_BLUE: &str = "color25";
pub const COLOR_MIDNIGHT_BLUE: &str = "color26";
pub const COLOR_MEDIUM_BLUE: &str = "color27";
pub const COLOR_COBALT_BLUE: &str = "color28";
pub const COLOR_VIOLET_BLUE: &str = "color29";
pub const COLOR_BLUE_VIOLET: &str = "color30";
pub const COLOR_MEDIUM_VIOLET: &str = "color31";
pub const COLOR_MEDIUM_ROSE: &str = "color32";
pub const COLOR_LAVENDER: &str = "color33";
pub const COLOR_ORCHID: &str = "color34";
pub const COLOR_THISTLE: &str = "color35";
pub const COLOR_PEACH: &str = "color36";
pub const COLOR_SALMON: &str = "color37";
pub const COLOR_MAGENTA: &str = "color38";
pub const COLOR_RED_VIOLET: &str = "color39";
pub const COLOR_MAHOGANY: &str = "color40";
pub const COLOR_BURNT_SIENNA: &str = "color41";
pub const COLOR_CHESTNUT: &str = "color42";

const COLORS: [(&str, &str); 41] = [
    ("red", COLOR_RED),
    ("green", COLOR_GREEN),
    ("blue", COLOR_BLUE),
    ("yellow", COLOR_YELLOW),
    ("copper", COLOR_COPPER),
    ("orange", COLOR_ORANGE),
    ("purple", COLOR_PURPLE),
    ("gray", COLOR_GRAY),
    ("light green", COLOR_LIGHT_GREEN),
    ("cyan", COLOR_CYAN),
    ("light gray", COLOR_LIGHT_GRAY),
    ("blue gray", COLOR_BLUE_GRAY),
    ("lime", COLOR_LIME),
    ("black", COLOR_BLACK),
    ("gold", COLOR_GOLD),
    ("brown", COLOR_BROWN),
    ("olive", COLOR_OLIVE),
    ("maroon", COLOR_MAROON),
    ("red-orange", COLOR_RED_ORANGE),
    ("yellow-orange", COLOR_YELLOW_ORANGE),
    ("forest green", COLOR_FOREST_GREEN),
    ("turquoise blue", COLOR_TURQUOISE_BLUE),
    ("azure blue", COLOR_AZURE_BLUE),
    ("cerulean blue", COLOR_CERULEAN_BLUE),
    ("midnight blue", COLOR_MIDNIGHT_BLUE),
    ("medium blue", COLOR_MEDIUM_BLUE),
    ("cobalt blue", COLOR_COBALT_BLUE),
    ("violet blue", COLOR_VIOLET_BLUE),
    ("blue violet", COLOR_BLUE_VIOLET),
    ("medium violet", COLOR_MEDIUM_VIOLET),
    ("medium rose", COLOR_MEDIUM_ROSE),
    ("lavender", COLOR_LAVENDER),
    ("orchid", COLOR_ORCHID),
    ("thistle", COLOR_THISTLE),
    ("peach", COLOR_PEACH),
    ("salmon", COLOR_SALMON),
    ("magenta", COLOR_MAGENTA),
    ("red violet", COLOR_RED_VIOLET),
    ("mahogany", COLOR_MAHOGANY),
    ("burnt sienna", COLOR_BURNT_SIENNA),
    ("chestnut", COLOR_CHESTNUT),
];

/// The `colorN` constant for a human color name, case-insensitively.
pub fn color_by_name(name: &str) -> Option<&'static str> {
    let wanted = name.trim().to_ascii_lowercase();
    COLORS
        .iter()
        .find(|(label, _)| *label == wanted)
        .map(|(_, color)| *color)
}

/// The human name of a `colorN` constant.
pub fn color_name(color: &str) -> Option<&'static str> {
    COLORS
        .iter()
        .find(|(_, value)| *value == color)
        .map(|(label, _)| *label)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub name: String,
    /// One of the `COLOR_*` constants, or empty.
    pub color: String,
    pub comment: String,
}

impl Object for Tag {
    const KIND: &'static str = "administrative tag";
    type Location = ObjectScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &ObjectScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("tag".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

struct EntryV1 {
    name: String,
    color: String,
    comments: String,
}

impl Wire for EntryV1 {
    type Entry = Tag;

    fn specify(e: &Tag) -> Result<Self, PangoError> {
        if !e.color.is_empty() && color_name(&e.color).is_none() {
            return Err(PangoError::validation(format!(
                "tag {:?}: unknown color {:?}",
                e.name, e.color
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            color: e.color.clone(),
            comments: e.comment.clone(),
        })
    }

    fn normalize(self) -> Tag {
        Tag {
            name: self.name,
            color: self.color,
            comment: self.comments,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", Tag::KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            color: text(node, &["color"]),
            comments: text(node, &["comments"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.text_el("color", &self.color);
        node.text_el("comments", &self.comments);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::{color_by_name, color_name, Tag, COLOR_FOREST_GREEN, COLOR_MAROON};
    use crate::codec::Object;
    use crate::version::V9_0;

    #[test]
    fn color_lookup_skips_color18() {
        assert_eq!(color_by_name("Forest Green"), Some(COLOR_FOREST_GREEN));
        assert_eq!(color_name("color19"), Some("maroon"));
        assert_eq!(color_by_name("maroon"), Some(COLOR_MAROON));
        assert_eq!(color_name("color18"), None);
    }

    #[test]
    fn unknown_color_is_rejected() {
        let tag = Tag {
            name: "t".to_string(),
            color: "color99".to_string(),
            ..Tag::default()
        };
        assert!(tag.specify(&V9_0).is_err());
    }
}
