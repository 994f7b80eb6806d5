use std::sync::{Arc, Mutex};

use folio_application::{
    AppContext, ContentLoader, LoadStatus, ModalPhase, ModalSession, NavDirection, SelectionStore,
    grid_neighbor, group_by_category,
};
use folio_core::{
    AssetSource, BookId, Catalog, ContactMessage, ContactService, FetchError, Language,
};
use folio_engine::{CoverState, Material, ShelfEngine, TextFetcher};
use folio_storage::{AssetOrigin, Storage};
use folio_test::{
    GatedSource, ScriptedSource, make_settings, png_bytes, scenario_catalog, wait_for,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn book(catalog: &Catalog, id: &str) -> folio_core::BookRecord {
    catalog.book(&BookId::new(id)).cloned().expect("fixture book")
}

#[test]
fn open_fetch_and_close_the_modal() {
    init_logging();
    let catalog = scenario_catalog();
    let source = Arc::new(ScriptedSource::new().with("notes/book1.md", "#alpha #beta\nSome notes."));
    let store = SelectionStore::new();
    let mut session = ModalSession::new(Language::English);
    let mut fetcher = TextFetcher::new(source.clone() as Arc<dyn AssetSource>);

    store.open_book_modal(book(&catalog, "book1"));
    let state = store.snapshot();
    assert!(state.is_modal_open());
    assert_eq!(state.selected_book().map(|b| b.id.as_str()), Some("book1"));

    let ticket = session.sync(&state).expect("opening issues a fetch");
    fetcher.spawn(ticket.clone(), &ticket.content_ref);
    let results = wait_for(|| fetcher.poll());
    assert_eq!(results.len(), 1);
    for (ticket, result) in results {
        assert!(session.resolve(&ticket, result));
    }

    assert_eq!(session.phase(), ModalPhase::Loaded);
    assert_eq!(session.content().status, LoadStatus::Loaded);
    assert_eq!(session.content().extracted_tags, vec!["alpha", "beta"]);
    assert_eq!(session.content().display_text, "Some notes.");

    store.close_book_modal();
    let state = store.snapshot();
    assert!(!state.is_modal_open());
    assert!(state.selected_book().is_none());
    assert!(session.sync(&state).is_none());
    assert_eq!(session.phase(), ModalPhase::Closed);
    assert_eq!(source.calls_for("notes/book1.md"), 1);
}

#[test]
fn failed_cover_keeps_accent_and_scene_stays_interactive() {
    init_logging();
    let catalog = scenario_catalog();
    let source = Arc::new(
        ScriptedSource::new()
            .with("covers/book1.png", png_bytes([200, 40, 40], 8))
            .failing("covers/book2.png", "connection reset")
            .with("covers/book3.png", png_bytes([40, 200, 40], 8)),
    );
    let mut engine = ShelfEngine::new(&catalog, source.clone() as Arc<dyn AssetSource>);

    let mut events = Vec::new();
    let hovered = BookId::new("book2");
    while events.len() < 3 {
        let batch = wait_for(|| engine.tick(0.016, Some(&hovered)));
        assert!(!batch.is_empty(), "cover fetches never settled");
        events.extend(batch);
    }
    assert_eq!(engine.covers().pending(), 0);

    let book2 = engine.scene().book(&hovered).expect("book2 mesh");
    assert_eq!(book2.front, Material::Solid(book(&catalog, "book2").accent_color));
    assert!(matches!(
        engine.covers().state("covers/book2.png"),
        Some(CoverState::Failed)
    ));

    let book1 = engine.scene().book(&BookId::new("book1")).expect("book1 mesh");
    assert_eq!(
        book1.front,
        Material::Cover {
            cover_ref: "covers/book1.png".to_string()
        }
    );

    assert!(!engine.covers_mut().request("covers/book2.png"));
    assert_eq!(source.calls_for("covers/book2.png"), 1);

    for _ in 0..30 {
        engine.tick(0.016, Some(&hovered));
    }
    let index = catalog.index_of(&hovered).expect("indexed");
    let pose = engine.poses()[index];
    let projected = engine
        .camera(1.0)
        .project(pose.position)
        .expect("book2 in front of the camera");
    assert_eq!(engine.pick((projected.x, projected.y), 1.0), Some(hovered));
}

#[test]
fn late_response_for_an_earlier_book_is_discarded() {
    init_logging();
    let catalog = scenario_catalog();
    let gate = Arc::new(GatedSource::new(&[
        ("notes/book1.md", "\nnotes for one"),
        ("notes/book2.md", "\nnotes for two"),
    ]));
    let mut fetcher = TextFetcher::new(gate.clone() as Arc<dyn AssetSource>);
    let mut loader = ContentLoader::new(Language::English);

    let first = loader.begin(&book(&catalog, "book1"));
    fetcher.spawn(first.clone(), &first.content_ref);
    let second = loader.begin(&book(&catalog, "book2"));
    fetcher.spawn(second.clone(), &second.content_ref);

    gate.release("notes/book2.md");
    for (ticket, result) in wait_for(|| fetcher.poll()) {
        assert!(loader.resolve(&ticket, result));
    }
    assert_eq!(loader.state().display_text, "notes for two");

    gate.release("notes/book1.md");
    for (ticket, result) in wait_for(|| fetcher.poll()) {
        assert_eq!(ticket, first);
        assert!(!loader.resolve(&ticket, result));
    }
    assert_eq!(loader.state().status, LoadStatus::Loaded);
    assert_eq!(loader.state().display_text, "notes for two");
    assert_eq!(fetcher.in_flight(), 0);
}

#[test]
fn closing_and_reopening_within_one_frame_starts_a_fresh_load() {
    init_logging();
    let store = SelectionStore::new();
    let mut ctx = AppContext::new(make_settings(), scenario_catalog()).with_store(store.clone());
    let source = Arc::new(ScriptedSource::new().failing("notes/book1.md", "offline"));
    let mut fetcher = TextFetcher::new(source.clone() as Arc<dyn AssetSource>);
    let mut session = ModalSession::new(ctx.settings.language);

    assert!(ctx.open_book(&BookId::new("book1")));
    let ticket = session.sync(&store.snapshot()).expect("first ticket");
    fetcher.spawn(ticket.clone(), &ticket.content_ref);
    for (ticket, result) in wait_for(|| fetcher.poll()) {
        session.resolve(&ticket, result);
    }
    assert_eq!(session.phase(), ModalPhase::Failed);

    ctx.store.close_book_modal();
    assert!(ctx.open_book(&BookId::new("book1")));
    let again = session.sync(&store.snapshot()).expect("reopen issues a new fetch");
    assert_ne!(again, ticket);
    assert_eq!(session.phase(), ModalPhase::Loading);
    assert!(session.content().display_text.is_empty());

    fetcher.spawn(again.clone(), &again.content_ref);
    wait_for(|| fetcher.poll());
    assert_eq!(source.calls_for("notes/book1.md"), 2);
    assert_eq!(ctx.settings.recent_books, vec!["book1".to_string()]);
    assert!(ctx.settings.reduced_motion);
}

#[test]
fn switching_books_while_open_shows_loading_not_old_notes() {
    let catalog = scenario_catalog();
    let store = SelectionStore::new();
    let mut session = ModalSession::new(Language::Chinese);

    store.open_book_modal(book(&catalog, "book1"));
    let ticket = session.sync(&store.snapshot()).expect("ticket");
    session.resolve(&ticket, Ok("#x\nfirst".into()));
    assert_eq!(session.content().display_text, "first");

    store.open_book_modal(book(&catalog, "book3"));
    let next = session.sync(&store.snapshot()).expect("new ticket");
    assert_eq!(next.book_id, BookId::new("book3"));
    assert_eq!(session.phase(), ModalPhase::Loading);
    assert!(session.content().display_text.is_empty());
    assert!(session.content().extracted_tags.is_empty());

    assert!(!session.resolve(&ticket, Ok("#x\nfirst again".into())));
    session.resolve(&next, Err(FetchError::NotFound(next.content_ref.clone())));
    assert_eq!(session.phase(), ModalPhase::Failed);
    assert_eq!(
        session.content().display_text,
        Language::Chinese.notes_load_failed()
    );
}

#[test]
fn store_pairing_and_hover_hold_for_every_notification() {
    let catalog = scenario_catalog();
    let store = SelectionStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |state| {
        if let Ok(mut seen) = sink.lock() {
            seen.push(state.clone());
        }
    });

    let ids = ["book1", "book2", "book3"];
    let mut seed: u32 = 7;
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let pick = ids[(seed >> 8) as usize % ids.len()];
        match (seed >> 16) % 6 {
            0 => store.open_book_modal(book(&catalog, pick)),
            1 => store.close_book_modal(),
            2 => store.set_hovered_book(Some(BookId::new(pick))),
            3 => store.set_hovered_book(None),
            4 => store.set_selected_book(None),
            _ => {
                store.set_is_modal_open((seed >> 20) % 2 == 0);
            }
        }
        let state = store.snapshot();
        assert_eq!(state.is_modal_open(), state.selected_book().is_some());
    }

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(
        seen.iter()
            .all(|state| state.is_modal_open() == state.selected_book().is_some())
    );
}

#[test]
fn grid_groups_partition_the_catalog_and_navigation_follows_rows() {
    let catalog = scenario_catalog();
    let groups = group_by_category(&catalog);
    let flattened: Vec<&str> = groups
        .iter()
        .flat_map(|group| group.books.iter().map(|book| book.id.as_str()))
        .collect();
    assert_eq!(flattened, vec!["book1", "book2", "book3"]);

    let start = grid_neighbor(&groups, None, NavDirection::Right);
    assert_eq!(start, Some(BookId::new("book1")));
    let right = grid_neighbor(&groups, start.as_ref(), NavDirection::Right);
    assert_eq!(right, Some(BookId::new("book2")));
    let down = grid_neighbor(&groups, right.as_ref(), NavDirection::Down);
    assert_eq!(down, Some(BookId::new("book3")));
}

#[test]
fn asset_origin_serves_notes_and_rejects_escapes() {
    init_logging();
    let root = std::env::temp_dir().join(format!("folio-scenario-{}", std::process::id()));
    std::fs::create_dir_all(root.join("notes")).unwrap();
    std::fs::write(root.join("notes/book1.md"), "#disk\nfrom disk").unwrap();

    let origin = Arc::new(AssetOrigin::new(&root));
    assert!(matches!(
        origin.fetch_text("../secret.md"),
        Err(FetchError::InvalidReference(_))
    ));
    assert!(matches!(
        origin.fetch_text("/etc/passwd"),
        Err(FetchError::InvalidReference(_))
    ));

    let catalog = scenario_catalog();
    let mut loader = ContentLoader::new(Language::English);
    let mut fetcher = TextFetcher::new(origin as Arc<dyn AssetSource>);
    let ticket = loader.begin(&book(&catalog, "book1"));
    fetcher.spawn(ticket.clone(), &ticket.content_ref);
    for (ticket, result) in wait_for(|| fetcher.poll()) {
        loader.resolve(&ticket, result);
    }
    assert_eq!(loader.state().extracted_tags, vec!["disk"]);
    assert_eq!(loader.state().display_text, "from disk");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn contact_submissions_are_validated_and_stored() -> anyhow::Result<()> {
    let mut storage = Storage::open_in_memory()?;

    assert!(ContactMessage::new("  ", "ada@example.org", "hi").is_err());
    assert!(ContactMessage::new("Ada", "ada.example.org", "hi").is_err());
    assert!(ContactMessage::new("Ada", "ada@localhost", "hi").is_err());

    let message = ContactMessage::new("Ada", "ada@example.org", "Loved the shelf")?;
    let receipt = storage.submit(&message)?;
    let outbox = storage.list_outbox()?;
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].id, receipt.id);
    assert_eq!(outbox[0].message, "Loved the shelf");
    Ok(())
}

#[test]
fn shipped_assets_cover_the_builtin_catalog() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
    let origin = AssetOrigin::new(root);
    let catalog = Catalog::builtin().expect("builtin catalog");
    for book in catalog.books() {
        let notes = origin.fetch_text(&book.content_ref).expect("notes present");
        assert!(!folio_core::parse_notes(&notes).body.is_empty(), "{}", book.id);
        let bytes = origin.fetch_bytes(&book.cover_image_ref).expect("cover present");
        folio_engine::CoverImage::decode(&book.cover_image_ref, &bytes).expect("cover decodes");
    }
}
