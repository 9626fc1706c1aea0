use e2e_suite::{created_id, expect_status, unique_name, HarnessContext};
use harness_config::ServiceKind;
use model::Pack;
use pretty_assertions::assert_eq;
use services::{response::select_text, PackService};

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_pack_authoring_round_trip() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let packs = PackService::for_session(&gatekeeper)?;
    let mut stored_packs = context.crud::<Pack>(ServiceKind::ScreenWriter)?;

    let mut pack = Pack::new(&unique_name("e2e-pack"), "End to end");
    let id = created_id(packs.create_pack(&pack)?)?;
    let stored = stored_packs.read(&pack)?.expect("pack row after create");
    assert_eq!(stored.title, pack.title);
    assert_eq!(stored.is_published, Some(false));

    pack.description = Some("updated by the harness".to_string());
    expect_status(packs.update_pack(&id, &pack)?, &[200])?;
    let stored = stored_packs.read(&pack)?.expect("pack row after update");
    assert_eq!(stored.description, pack.description);

    expect_status(packs.delete_pack(&id)?, &[200, 204])?;
    assert_eq!(stored_packs.read(&pack)?, None);
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_publishing_marks_pack_published() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let packs = PackService::for_session(&gatekeeper)?;
    let mut stored_packs = context.crud::<Pack>(ServiceKind::ScreenWriter)?;

    let pack = stored_packs.create(&mut Pack::new(&unique_name("e2e-publish"), "Publish me"))?;
    let id = pack.pack_id.expect("id").to_string();

    let published = packs
        .publish_pack(&id)
        .map_err(anyhow::Error::from)
        .and_then(|response| expect_status(response, &[200, 302]));
    let stored = stored_packs.read(&pack);
    let teardown = stored_packs.clear_cache();

    published?;
    assert_eq!(stored?.and_then(|p| p.is_published), Some(true));
    teardown?;
    Ok(())
}

#[test]
#[ignore = "live: needs a deployed environment"]
fn test_pack_content_page_renders_title() -> anyhow::Result<()> {
    let context = HarnessContext::from_env()?;
    let gatekeeper = context.admin_session()?;
    let packs = PackService::for_session(&gatekeeper)?;
    let mut stored_packs = context.crud::<Pack>(ServiceKind::ScreenWriter)?;

    let pack = stored_packs.create(&mut Pack::new(&unique_name("e2e-content"), "Rendered title"))?;
    let id = pack.pack_id.expect("id").to_string();
    let page = expect_status(packs.pack_content(&id)?, &[200])?.text()?;
    stored_packs.clear_cache()?;

    let headings = select_text(&page, "h1, h2")?;
    assert!(headings.iter().any(|h| h.contains("Rendered title")), "{headings:?}");
    Ok(())
}
