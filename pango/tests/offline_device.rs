use std::time::Duration;

use pango::client::Client;
use pango::dev::General;
use pango::namespace::{Importable, Movement, Policy, Singleton, Standard};
use pango::netw::Ethernet;
use pango::objs::{Address, AddressGroup, AddressValue};
use pango::offline::OfflineDevice;
use pango::ops::{commit_and_wait, Commit};
use pango::poli::SecurityRule;
use pango::version::{V8_0, V9_0};
use pango::xpath::{NetworkScope, ObjectScope, RulebaseScope};
use pretty_assertions::assert_eq;

const SAVED: &str = r#"<?xml version="1.0"?>
<config version="9.0.0">
  <devices>
    <entry name="localhost.localdomain">
      <deviceconfig>
        <system>
          <hostname>fw-lab</hostname>
          <ip-address>192.0.2.10</ip-address>
          <netmask>255.255.255.0</netmask>
          <snmp-setting><access-setting><version><v2c/></version></access-setting></snmp-setting>
        </system>
      </deviceconfig>
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="web" admin="alice" dirtyId="3" time="2024/01/01 10:00:00">
              <ip-netmask>10.0.0.10/32</ip-netmask>
              <description>web frontend</description>
            </entry>
            <entry name="db">
              <fqdn>db.example.com</fqdn>
            </entry>
          </address>
          <rulebase>
            <security>
              <rules>
                <entry name="allow-web"><action>allow</action></entry>
                <entry name="allow-db"><action>allow</action></entry>
                <entry name="deny-all"><action>deny</action></entry>
              </rules>
            </security>
          </rulebase>
        </entry>
      </vsys>
    </entry>
  </devices>
  <shared/>
</config>"#;

fn device() -> OfflineDevice {
    OfflineDevice::from_xml(V9_0, SAVED.as_bytes()).expect("saved config")
}

fn vsys1() -> ObjectScope {
    ObjectScope::vsys("vsys1")
}

#[test]
fn reads_entries_from_a_saved_configuration() {
    let device = device();
    let ns: Standard<'_, Address> = Standard::new(&device);

    assert_eq!(ns.get_list(&vsys1()).expect("list"), vec!["web", "db"]);
    let web = ns.get(&vsys1(), "web").expect("web");
    assert_eq!(web.value, AddressValue::IpNetmask("10.0.0.10/32".to_string()));
    assert_eq!(web.description, "web frontend");

    let all = ns.get_all(&vsys1()).expect("all");
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].value, AddressValue::Fqdn("db.example.com".to_string()));

    let missing = ns.get(&vsys1(), "nope").expect_err("missing");
    assert!(missing.is_not_found());
    assert!(ns.get_list(&ObjectScope::vsys("vsys2")).expect("list").is_empty());
}

#[test]
fn from_panos_config_matches_live_reads() {
    let device = device();
    let ns: Standard<'_, Address> = Standard::new(&device);
    let config = device.candidate();
    assert_eq!(
        ns.from_panos_config(&vsys1(), "web", &config).expect("decode"),
        ns.get(&vsys1(), "web").expect("get")
    );
    assert_eq!(
        ns.all_from_panos_config(&vsys1(), &config).expect("decode all"),
        ns.get_all(&vsys1()).expect("get all")
    );
}

#[test]
fn set_edit_delete_cycle() {
    let device = device();
    let ns: Standard<'_, Address> = Standard::new(&device);
    let app = Address {
        name: "app".to_string(),
        value: AddressValue::IpRange("10.0.1.1-10.0.1.9".to_string()),
        tags: vec!["prod".to_string()],
        ..Address::default()
    };
    let mut web = ns.get(&vsys1(), "web").expect("web");
    web.description = "renamed".to_string();
    ns.set(&vsys1(), &[app.clone(), web.clone()]).expect("bulk set");
    assert_eq!(ns.get(&vsys1(), "app").expect("app"), app);
    assert_eq!(ns.get(&vsys1(), "web").expect("web").description, "renamed");

    let mut db = ns.get(&vsys1(), "db").expect("db");
    db.value = AddressValue::IpNetmask("10.0.2.2".to_string());
    ns.edit(&vsys1(), &db).expect("edit");
    assert_eq!(ns.get(&vsys1(), "db").expect("db"), db);

    ns.delete(&vsys1(), ["app", "db"]).expect("delete");
    assert_eq!(ns.get_list(&vsys1()).expect("list"), vec!["web"]);

    let history = device.history();
    let verbs: Vec<&str> = history.iter().map(|r| r.verb).collect();
    assert!(verbs.contains(&"set"));
    assert!(verbs.contains(&"edit"));
    assert!(verbs.contains(&"delete"));
}

#[test]
fn era_only_values_are_refused_on_older_devices() {
    let device = OfflineDevice::from_xml(V8_0, SAVED.as_bytes()).expect("saved config");
    let ns: Standard<'_, Address> = Standard::new(&device);
    let wildcard = Address {
        name: "wild".to_string(),
        value: AddressValue::IpWildcard("10.0.0.0/0.0.255.0".to_string()),
        ..Address::default()
    };
    assert!(ns.set(&vsys1(), &[wildcard]).is_err());
    assert!(device.history().is_empty());
}

#[test]
fn rules_are_reordered_as_a_group() {
    let device = device();
    let rules: Policy<'_, SecurityRule> = Policy::new(&device);
    let loc = RulebaseScope::vsys("vsys1");

    rules
        .move_group(&loc, Movement::Top, "", &["deny-all", "allow-web"])
        .expect("move to top");
    assert_eq!(
        rules.get_list(&loc).expect("list"),
        vec!["deny-all", "allow-web", "allow-db"]
    );

    rules
        .move_group(&loc, Movement::DirectlyAfter, "allow-db", &["deny-all"])
        .expect("move after");
    assert_eq!(
        rules.get_list(&loc).expect("list"),
        vec!["allow-web", "allow-db", "deny-all"]
    );

    let moves_before = device
        .history()
        .iter()
        .filter(|r| r.verb == "move")
        .count();
    rules
        .move_group(&loc, Movement::Bottom, "", &["deny-all"])
        .expect("already at bottom");
    let moves_after = device
        .history()
        .iter()
        .filter(|r| r.verb == "move")
        .count();
    assert_eq!(moves_before, moves_after);
}

#[test]
fn interfaces_are_imported_into_their_vsys() {
    let device = device();
    let ns: Importable<'_, Ethernet> = Importable::new(&device);
    let eth = Ethernet {
        name: "ethernet1/3".to_string(),
        mode: "layer3".to_string(),
        static_ips: vec!["198.51.100.1/24".to_string()],
        ..Ethernet::default()
    };
    ns.set(&NetworkScope::Firewall, "vsys1", &[eth]).expect("set");

    let config = device.candidate();
    assert_eq!(
        config.find(&["devices", "entry", "vsys", "entry", "import", "network", "interface", "member"])
            .and_then(|m| m.text.as_deref()),
        Some("ethernet1/3")
    );

    ns.delete(&NetworkScope::Firewall, ["ethernet1/3"]).expect("delete");
    let config = device.candidate();
    assert!(config
        .find(&["devices", "entry", "vsys", "entry", "import", "network", "interface"])
        .map(|list| list.children.is_empty())
        .unwrap_or(true));
    assert!(ns.get_list(&NetworkScope::Firewall).expect("list").is_empty());
}

#[test]
fn singleton_settings_keep_unmodeled_children() {
    let device = device();
    let ns: Singleton<'_, General> = Singleton::new(&device);
    let mut general = ns.get(&NetworkScope::Firewall).expect("general");
    assert_eq!(general.hostname, "fw-lab");
    general.hostname = "fw-prod".to_string();
    ns.edit(&NetworkScope::Firewall, &general).expect("edit");

    let config = device.candidate();
    let system = config
        .find(&["devices", "entry", "deviceconfig", "system"])
        .expect("system");
    assert_eq!(system.get_text(&["hostname"]), Some("fw-prod"));
    assert!(system.get_child("snmp-setting").is_some());
}

#[test]
fn commit_promotes_candidate_and_finishes_the_job() {
    let device = device();
    let ns: Standard<'_, AddressGroup> = Standard::new(&device);
    let group = AddressGroup {
        name: "frontends".to_string(),
        static_addresses: vec!["web".to_string()],
        ..AddressGroup::default()
    };
    ns.set(&vsys1(), &[group.clone()]).expect("set");
    assert!(ns.show(&vsys1(), "frontends").is_err());

    let job = commit_and_wait(&device, &Commit::default(), Duration::from_millis(10), None)
        .expect("commit")
        .expect("job");
    assert!(job.is_finished());
    assert_eq!(ns.show(&vsys1(), "frontends").expect("running"), group);

    let again = commit_and_wait(&device, &Commit::default(), Duration::from_millis(10), None)
        .expect("commit");
    assert!(again.is_none());
}

#[test]
fn unsupported_operational_verbs_are_peer_errors() {
    let device = device();
    assert!(device.uid("<uid-message/>", "vsys1").is_err());
    assert!(device.log_result(1).is_err());
    assert!(device
        .op("<show><system><info/></system></show>", "")
        .expect_err("op")
        .panos_message()
        .is_some());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("running.xml");
    let device = device();
    device.save(&path).expect("save");

    let loaded = OfflineDevice::load(V9_0, &path).expect("load");
    assert_eq!(loaded.candidate(), device.candidate());
}
