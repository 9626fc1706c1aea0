use e2e_suite::{created_id, expect_status, unique_name, HarnessContext};
use harness_config::ServiceKind;
use model::{Application, Group, User};
use pretty_assertions::assert_eq;
use services::{response::envelope, LoginState};

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_wrong_password_is_rejected() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let mut gatekeeper = context.gatekeeper()?;
    gatekeeper.login("admin", "definitely-not-the-password")?;
    assert_eq!(gatekeeper.state(), LoginState::Unauthenticated);
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_user_created_through_api_is_stored() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let mut users = context.crud::<User>(ServiceKind::Gatekeeper)?;

    let name = unique_name("e2e-user");
    let user = User::new(&name, &format!("{name}@example.org"), "E2e-passw0rd!");
    let id = created_id(gatekeeper.create_user(&user)?)?;

    let stored = users.read(&user)?.expect("user row after create");
    assert_eq!(stored.email, user.email);
    assert_eq!(stored.user_id.map(|id| id.to_string()), Some(id.clone()));
    assert_eq!(stored.password, None);

    expect_status(gatekeeper.delete_user(&id)?, &[200, 204])?;
    assert_eq!(users.read(&user)?, None);
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_new_user_can_log_in_and_see_own_session() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let admin = context.admin_session()?;

    let name = unique_name("e2e-login");
    let password = "E2e-passw0rd!";
    let id = created_id(admin.create_user(&User::new(&name, &format!("{name}@example.org"), password))?)?;

    let session = admin.as_user(&name, password)?;
    let info = session.session_info()?;
    let username = info.data.as_ref().and_then(|data| data.get("username")).cloned();
    assert_eq!(username, Some(serde_json::json!(name)));

    expect_status(admin.delete_user(&id)?, &[200, 204])?;
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_application_lifecycle() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let mut applications = context.crud::<Application>(ServiceKind::Gatekeeper)?;

    let name = unique_name("e2e-app");
    let mut application = Application::new(&name, "https://app.example.org/");
    let id = created_id(gatekeeper.create_application(&application)?)?;
    assert!(applications.read(&application)?.is_some());

    application.display_name = Some(format!("{name} (renamed)"));
    expect_status(gatekeeper.update_application(&id, &application)?, &[200])?;
    let stored = applications.read(&application)?.expect("application row");
    assert_eq!(stored.display_name, application.display_name);

    expect_status(gatekeeper.delete_application(&id)?, &[200, 204])?;
    assert_eq!(applications.read(&application)?, None);
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_group_created_in_database_is_listed() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let mut groups = context.crud::<Group>(ServiceKind::Gatekeeper)?;

    let group = groups.create(&mut Group::new(&unique_name("e2e-group")))?;
    let listed = envelope::<serde_json::Value>(expect_status(gatekeeper.list_groups()?, &[200])?)?;
    let names: Vec<String> = listed
        .data
        .as_ref()
        .and_then(|data| data.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(|n| n.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let teardown = groups.clear_cache();

    assert!(names.contains(group.name.as_ref().expect("name")), "{names:?}");
    assert_eq!(teardown?, 1);
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_unknown_permission_is_denied() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let response = gatekeeper.validate_permission("e2e-no-such-app", &unique_name("perm"))?;
    assert!(matches!(response.status().as_u16(), 403 | 404), "{}", response.status());
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_logout_ends_the_session() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let mut gatekeeper = context.admin_session()?;
    gatekeeper.logout()?;

    let status = gatekeeper.client().get("session", "v1", &[], &[])?.status();
    assert!(matches!(status.as_u16(), 302 | 401 | 403), "{status}");
    Ok(())
}
