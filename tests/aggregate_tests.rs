//! Aggregate behavior: declaration, define/finalize, merge order
//!
//! Exercises the public VmConfig API the way a loader would.

use serde_json::json;

use vm_config::vm::{
    block, ForwardPortOptions, ForwardedPort, NetworkArg, ProviderConfig, Protocol,
    ShareFolderOptions, Settings, VmConfig, DEFAULT_VM_NAME,
};

fn options(value: serde_json::Value) -> Option<Settings> {
    value.as_object().cloned()
}

// === Named entries ===

#[test]
fn test_forward_port_count_and_default_names() {
    let pairs: &[(u16, u16)] = &[(22, 2222), (80, 8080), (80, 8080), (443, 8443), (3306, 3306)];

    let mut config = VmConfig::new();
    for &(guest, host) in pairs {
        config.forward_port(guest, host, ForwardPortOptions::default());
    }

    assert_eq!(config.forwarded_ports().len(), pairs.len());
    for (port, &(guest, host)) in config.forwarded_ports().iter().zip(pairs) {
        assert_eq!(port.name, ForwardedPort::default_name(guest, host));
    }
    assert_eq!(config.forwarded_ports()[1].name, "2g-7sg");
}

#[test]
fn test_forward_port_explicit_options_win() {
    let mut config = VmConfig::new();
    config.forward_port(
        53,
        1053,
        ForwardPortOptions::default()
            .name("dns")
            .protocol(Protocol::Udp)
            .adapter(3)
            .auto(true),
    );

    let port = &config.forwarded_ports()[0];
    assert_eq!(port.name, "dns");
    assert_eq!(port.protocol, Protocol::Udp);
    assert_eq!(port.adapter, 3);
    assert!(port.auto);
}

#[test]
fn test_share_folder_same_name_keeps_one_key() {
    let mut config = VmConfig::new();
    config.share_folder("code", "/code", "src", ShareFolderOptions::default().nfs(true));
    config.share_folder("other", "/other", "other", ShareFolderOptions::default());
    config.share_folder("code", "/code2", "src2", ShareFolderOptions::default());

    assert_eq!(config.shared_folders().len(), 2);
    let code = config.shared_folders().get("code").unwrap();
    assert_eq!(code.guest_path, "/code2");
    assert_eq!(code.host_path, "src2");
    // Only the latest call's options survive
    assert!(!code.nfs);

    let keys: Vec<_> = config.shared_folders().keys().collect();
    assert_eq!(keys, vec!["code", "other"]);
}

// === Sub-machines ===

#[test]
fn test_finalize_on_empty_aggregate() {
    let mut config = VmConfig::new();
    config.finalize();

    assert_eq!(config.machine_names(), vec![DEFAULT_VM_NAME]);

    config.finalize();
    assert_eq!(config.defined_vm_keys().len(), 1);
}

#[test]
fn test_finalize_with_explicit_machine_adds_no_default() {
    let mut config = VmConfig::new();
    config.define("web", None, None);
    config.finalize();

    assert_eq!(config.machine_names(), vec!["web"]);
    assert!(config.machines().get(DEFAULT_VM_NAME).is_none());
}

#[test]
fn test_define_twice_accumulates() {
    let mut config = VmConfig::new();
    config.define(
        "web",
        options(json!({"opt": 1})),
        Some(block(|c: &mut VmConfig| {
            c.forward_port(80, 8080, ForwardPortOptions::default());
        })),
    );
    config.define(
        "web",
        options(json!({"opt2": 2})),
        Some(block(|c: &mut VmConfig| {
            c.forward_port(443, 8443, ForwardPortOptions::default());
        })),
    );

    assert_eq!(config.defined_vm_keys(), &["web", "web"]);
    assert_eq!(config.machine_names(), vec!["web"]);

    let web = config.machines().get("web").unwrap();
    assert_eq!(web.options()["opt"], 1);
    assert_eq!(web.options()["opt2"], 2);
    assert_eq!(web.block_count(), 2);

    // Blocks replay in definition order
    let materialized = web.materialize();
    let guests: Vec<_> = materialized.forwarded_ports().iter().map(|p| p.guest_port).collect();
    assert_eq!(guests, vec![80, 443]);
}

#[test]
fn test_redefine_does_not_move_machine() {
    let mut config = VmConfig::new();
    config.define("web", None, None);
    config.define("db", None, None);
    config.define("web", None, None);

    assert_eq!(config.machine_names(), vec!["web", "db"]);
}

// === Providers ===

#[test]
fn test_provider_lookup_side_effect_is_explicit() {
    let mut config = VmConfig::new();
    assert!(config.providers().get("virtualbox").is_none());
    assert!(config.providers().is_empty());

    config.providers_mut().get_or_create("virtualbox");
    assert_eq!(config.providers().len(), 1);
    assert!(!config.providers().get("virtualbox").unwrap().has_block());
}

#[test]
fn test_provider_redeclare_last_wins() {
    let mut config = VmConfig::new();
    config.provider(
        "virtualbox",
        Some(block(|p: &mut ProviderConfig| p.set("memory", json!(512)))),
    );
    config.provider(
        "virtualbox",
        Some(block(|p: &mut ProviderConfig| p.set("memory", json!(2048)))),
    );

    let settings = config.providers().get("virtualbox").unwrap().materialize().settings;
    assert_eq!(settings["memory"], 2048);
}

// === Merge ===

#[test]
fn test_merge_parent_entries_first() {
    let mut a = VmConfig::new();
    a.forward_port(1, 1001, ForwardPortOptions::default());
    a.network("hostonly", vec![NetworkArg::string("10.0.0.2")]);
    a.provision("shell", options(json!({"inline": "a"})), None);

    let mut b = VmConfig::new();
    b.forward_port(2, 1002, ForwardPortOptions::default());
    b.network("bridged", vec![]);
    b.provision("shell", options(json!({"inline": "b"})), None);

    let merged = a.merge(&b);

    let ports: Vec<_> = merged.forwarded_ports().iter().map(|p| p.guest_port).collect();
    assert_eq!(ports, vec![1, 2]);
    let nets: Vec<_> = merged.networks().iter().map(|n| n.kind.as_str()).collect();
    assert_eq!(nets, vec!["hostonly", "bridged"]);
    let inlines: Vec<_> = merged
        .provisioners()
        .iter()
        .map(|p| p.options()["inline"].clone())
        .collect();
    assert_eq!(inlines, vec![json!("a"), json!("b")]);
}

#[test]
fn test_merge_is_associative_in_application_order() {
    let layer = |guest: u16, box_name: Option<&str>| {
        let mut c = VmConfig::new();
        c.forward_port(guest, guest + 1000, ForwardPortOptions::default());
        c.box_name = box_name.map(String::from);
        c
    };
    let (a, b, c) = (layer(1, Some("a")), layer(2, None), layer(3, Some("c")));

    let left = a.merge(&b).merge(&c);
    let right = a.merge(&b.merge(&c));

    let ports = |cfg: &VmConfig| cfg.forwarded_ports().iter().map(|p| p.guest_port).collect::<Vec<_>>();
    assert_eq!(ports(&left), ports(&right));
    assert_eq!(left.box_name, right.box_name);
    assert_eq!(left.box_name.as_deref(), Some("c"));
}

#[test]
fn test_merge_unset_child_scalars_keep_parent() {
    let mut parent = VmConfig::new();
    parent.box_name = Some("base".to_string());
    parent.base_mac = Some("0800".to_string());
    parent.host_name = Some("parent".to_string());

    let mut child = VmConfig::new();
    child.host_name = Some("child".to_string());

    let merged = parent.merge(&child);
    assert_eq!(merged.box_name.as_deref(), Some("base"));
    assert_eq!(merged.base_mac.as_deref(), Some("0800"));
    assert_eq!(merged.host_name.as_deref(), Some("child"));
}

#[test]
fn test_merge_sub_machines() {
    let mut parent = VmConfig::new();
    parent.define("web", options(json!({"primary": true})), None);

    let mut child = VmConfig::new();
    child.define("db", None, None);
    child.define("web", options(json!({"autostart": false})), None);

    let merged = parent.merge(&child);
    assert_eq!(merged.machine_names(), vec!["web", "db"]);

    let web = merged.machines().get("web").unwrap();
    assert_eq!(web.options()["primary"], true);
    assert_eq!(web.options()["autostart"], false);
}
