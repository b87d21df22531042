use std::{collections::BTreeSet, sync::Arc};

use rstest::rstest;
use serde_json::json;

use busgate_common::{DBUS_INTERFACE, DBUS_PATH, DBUS_SERVICE, INTROSPECTABLE_INTERFACE};
use busgate_lib::http::{Method, Request, Status};

use fixture::{bus, drive, string_array, xml_reply, MockBus};

const CONNECTION: &str = "org.example.Hosts";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_bus_index_is_static(bus: Arc<MockBus>) {
    let response = drive(&bus, Request::new(Method::Get, "/bus/")).await;

    assert_eq!(response.status, Status::Ok);
    assert_eq!(
        response.body.unwrap(),
        json!({"busses": [{"name": "system"}], "status": "ok"})
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bus_names_arrive_sorted(bus: Arc<MockBus>) {
    bus.on(
        DBUS_SERVICE,
        DBUS_PATH,
        DBUS_INTERFACE,
        "ListNames",
        Ok(vec![string_array(&["org.example.B", "org.example.A"])]),
    );

    let response = drive(&bus, Request::new(Method::Get, "/bus/system/")).await;

    assert_eq!(response.status, Status::Ok);
    assert_eq!(
        response.body.unwrap(),
        json!({
            "status": "ok",
            "objects": [{"name": "org.example.A"}, {"name": "org.example.B"}],
        })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bus_name_listing_failures_map_to_a_500(bus: Arc<MockBus>) {
    let response = drive(&bus, Request::new(Method::Get, "/bus/system/")).await;
    assert_eq!(response.status, Status::InternalError);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_walker_visits_every_reachable_node(bus: Arc<MockBus>) {
    bus.on(
        CONNECTION,
        "/",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply("<node><node name=\"xyz\"/></node>")),
    );
    bus.on(
        CONNECTION,
        "/xyz",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply(
            "<node><node name=\"host0\"/><node name=\"host1\"/></node>",
        )),
    );
    bus.on(
        CONNECTION,
        "/xyz/host0",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply("<node/>")),
    );
    bus.on(
        CONNECTION,
        "/xyz/host1",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply("<node/>")),
    );

    let response = drive(
        &bus,
        Request::new(Method::Get, "/bus/system/org.example.Hosts/"),
    )
    .await;

    assert_eq!(response.status, Status::Ok);
    let body = response.body.unwrap();
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["bus_name"], json!(CONNECTION));

    // Sibling completion order is not defined
    let paths: BTreeSet<String> = body["objects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|object| object["path"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(
        paths,
        BTreeSet::from([
            "/".to_owned(),
            "/xyz".to_owned(),
            "/xyz/host0".to_owned(),
            "/xyz/host1".to_owned(),
        ])
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_node_that_fails_to_parse_prunes_its_subtree(bus: Arc<MockBus>) {
    bus.on(
        CONNECTION,
        "/",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply("<node><node name=\"xyz\"/><node name=\"org\"/></node>")),
    );
    // /xyz answers garbage; /org answers nothing at all
    bus.on(
        CONNECTION,
        "/xyz",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply("garbage")),
    );

    let response = drive(
        &bus,
        Request::new(Method::Get, "/bus/system/org.example.Hosts/"),
    )
    .await;

    assert_eq!(response.status, Status::Ok);
    let body = response.body.unwrap();
    let paths: BTreeSet<String> = body["objects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|object| object["path"].as_str().unwrap().to_owned())
        .collect();

    // The garbage node was reached, so it is listed; nothing below it is
    assert_eq!(paths, BTreeSet::from(["/".to_owned(), "/xyz".to_owned()]));
}

const HOST_XML: &str = r#"
    <node>
        <interface name="org.freedesktop.DBus.Properties"/>
        <interface name="xyz.openbmc_project.State.Host">
            <method name="Transition">
                <arg name="target" type="s" direction="in"/>
                <arg name="accepted" type="b" direction="out"/>
            </method>
            <signal name="StateChanged">
                <arg name="state" type="s"/>
            </signal>
        </interface>
    </node>
"#;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn an_object_without_an_interface_lists_its_interfaces(bus: Arc<MockBus>) {
    bus.on(
        CONNECTION,
        "/xyz/host0",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply(HOST_XML)),
    );

    let response = drive(
        &bus,
        Request::new(Method::Get, "/bus/system/org.example.Hosts/xyz/host0"),
    )
    .await;

    assert_eq!(response.status, Status::Ok);
    assert_eq!(
        response.body.unwrap(),
        json!({
            "status": "ok",
            "bus_name": CONNECTION,
            "interfaces": [
                {"name": "org.freedesktop.DBus.Properties"},
                {"name": "xyz.openbmc_project.State.Host"},
            ],
            "object_path": "/xyz/host0",
        })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn an_interface_describes_its_methods_and_signals(bus: Arc<MockBus>) {
    bus.on(
        CONNECTION,
        "/xyz/host0",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply(HOST_XML)),
    );

    let response = drive(
        &bus,
        Request::new(
            Method::Get,
            "/bus/system/org.example.Hosts/xyz/host0/xyz.openbmc_project.State.Host",
        ),
    )
    .await;

    assert_eq!(response.status, Status::Ok);
    assert_eq!(
        response.body.unwrap(),
        json!({
            "status": "ok",
            "bus_name": CONNECTION,
            "interface": "xyz.openbmc_project.State.Host",
            "methods": [{
                "name": "Transition",
                "uri": "/bus/system/org.example.Hosts/xyz/host0/xyz.openbmc_project.State.Host/Transition",
                "args": [
                    {"name": "target", "type": "s", "direction": "in"},
                    {"name": "accepted", "type": "b", "direction": "out"},
                ],
            }],
            "object_path": "/xyz/host0",
            "properties": {},
            "signals": [{
                "name": "StateChanged",
                "args": [{"name": "state", "type": "s"}],
            }],
        })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn an_unknown_interface_is_not_found(bus: Arc<MockBus>) {
    bus.on(
        CONNECTION,
        "/xyz/host0",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply(HOST_XML)),
    );

    let response = drive(
        &bus,
        Request::new(
            Method::Get,
            "/bus/system/org.example.Hosts/xyz/host0/org.example.Missing",
        ),
    )
    .await;

    assert_eq!(response.status, Status::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn segments_past_the_method_name_never_resolve(bus: Arc<MockBus>) {
    let response = drive(
        &bus,
        Request::new(
            Method::Get,
            "/bus/system/org.example.Hosts/xyz/host0/org.example.If/Method/extra",
        ),
    )
    .await;

    assert_eq!(response.status, Status::NotFound);
    assert!(bus.calls_to("Introspect").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unparseable_introspection_maps_to_a_500(bus: Arc<MockBus>) {
    bus.on(
        CONNECTION,
        "/xyz/host0",
        INTROSPECTABLE_INTERFACE,
        "Introspect",
        Ok(xml_reply("garbage")),
    );

    let response = drive(
        &bus,
        Request::new(Method::Get, "/bus/system/org.example.Hosts/xyz/host0"),
    )
    .await;

    assert_eq!(response.status, Status::InternalError);
    assert_eq!(
        response.body.unwrap(),
        json!({"status": "XML parse error"})
    );
}
