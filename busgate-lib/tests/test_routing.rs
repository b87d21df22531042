use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use busgate_common::{mapper_path, mapper_service, value::BusValue, MAPPER_INTERFACE};
use busgate_lib::http::{Method, Request, Status};

use fixture::{bus, drive, string_array, MockBus};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_bus_namespace_only_accepts_get(bus: Arc<MockBus>) {
    for path in ["/bus/", "/bus/system/", "/bus/system/org.example.A/"] {
        let response = drive(&bus, Request::new(Method::Put, path)).await;
        assert_eq!(response.status, Status::MethodNotAllowed, "PUT {path}");
    }

    let response = drive(&bus, Request::new(Method::Post, "/list/")).await;
    assert_eq!(response.status, Status::MethodNotAllowed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_the_system_bus_exists(bus: Arc<MockBus>) {
    let response = drive(&bus, Request::new(Method::Get, "/bus/session/")).await;
    assert_eq!(response.status, Status::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn post_requires_an_action_suffix(bus: Arc<MockBus>) {
    let response = drive(
        &bus,
        Request::with_body(Method::Post, "/xyz/openbmc_project/thing", "[]"),
    )
    .await;
    assert_eq!(response.status, Status::MethodNotAllowed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_verbs_are_rejected(bus: Arc<MockBus>) {
    let response = drive(&bus, Request::new(Method::Delete, "/xyz/thing")).await;
    assert_eq!(response.status, Status::MethodNotAllowed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_root_list_route_queries_the_whole_tree(bus: Arc<MockBus>) {
    bus.on(
        &mapper_service(),
        &mapper_path(),
        MAPPER_INTERFACE,
        "GetSubTreePaths",
        Ok(vec![string_array(&["/xyz"])]),
    );

    let response = drive(&bus, Request::new(Method::Get, "/list/")).await;

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.body.unwrap()["data"], json!(["/xyz"]));
    assert_eq!(
        bus.calls_to("GetSubTreePaths")[0].args[0],
        BusValue::Str("/".into())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn trailing_slashes_are_trimmed(bus: Arc<MockBus>) {
    bus.on(
        &mapper_service(),
        &mapper_path(),
        MAPPER_INTERFACE,
        "GetSubTreePaths",
        Ok(vec![string_array(&[])]),
    );

    let response = drive(
        &bus,
        Request::new(Method::Get, "/xyz/openbmc_project/list/"),
    )
    .await;

    assert_eq!(response.status, Status::Ok);
    assert_eq!(
        bus.calls_to("GetSubTreePaths")[0].args[0],
        BusValue::Str("/xyz/openbmc_project".into())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_last_attr_separator_wins(bus: Arc<MockBus>) {
    // Resolution fails, but the path split is observable in the call
    let response = drive(
        &bus,
        Request::new(Method::Get, "/xyz/a/attr/b/attr/c"),
    )
    .await;

    assert_eq!(response.status, Status::NotFound);
    assert_eq!(
        bus.calls_to("GetObject")[0].args[0],
        BusValue::Str("/xyz/a/attr/b".into())
    );

    let response = drive(
        &bus,
        Request::new(Method::Get, "/xyz/attr/a/attr/b"),
    )
    .await;

    assert_eq!(response.status, Status::NotFound);
    assert_eq!(
        bus.calls_to("GetObject")[1].args[0],
        BusValue::Str("/xyz/attr/a".into())
    );
}
