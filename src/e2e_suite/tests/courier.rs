use e2e_suite::{created_id, expect_status, unique_name, HarnessContext};
use serde_json::json;
use services::{response::envelope, CourierService};

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_package_lifecycle() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let courier = CourierService::for_session(&gatekeeper)?;

    let name = unique_name("e2e-package");
    let id = created_id(courier.create_package(&json!({"name": name, "version": 1}))?)?;

    let fetched = envelope::<serde_json::Value>(expect_status(courier.get_package(&id)?, &[200])?)?;
    assert_eq!(fetched.data.as_ref().and_then(|d| d.get("name")), Some(&json!(name)));

    expect_status(courier.delete_package(&id)?, &[200, 204])?;
    assert_eq!(courier.get_package(&id)?.status().as_u16(), 404);
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_registered_device_is_listed() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let courier = CourierService::for_session(&gatekeeper)?;

    let serial = unique_name("SN");
    expect_status(
        courier.register_device(&json!({"serial_number": serial, "kind": "player"}))?,
        &[200, 201],
    )?;

    let devices = envelope::<Vec<serde_json::Value>>(expect_status(courier.list_devices()?, &[200])?)?;
    let listed = devices
        .data
        .unwrap_or_default()
        .iter()
        .any(|device| device.get("serial_number") == Some(&json!(serial)));
    assert!(listed, "{serial} not listed");
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_anonymous_package_listing_is_refused() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let courier = CourierService::new(context.config())?;
    let status = courier.list_packages(&[])?.status().as_u16();
    assert!(matches!(status, 302 | 401 | 403), "{status}");
    Ok(())
}
