//! Record creation, slug retries and the at-most-once welcome notice.

use domains::{Actor, ContentKind, DomainError, OwnerDirectory, RecordStatus, Role};
use integration_tests::{hours_ago, legacy_entry, Catalog};
use services::NewProject;
use uuid::Uuid;

fn project(title: &str) -> NewProject {
    NewProject { title: title.into(), kind: ContentKind::Game, ..NewProject::default() }
}

#[tokio::test]
async fn five_creates_send_one_welcome_despite_failures() {
    let catalog = Catalog::new(vec![]);
    let owner = catalog.register_owner("newdev");
    // First two deliveries fail; the flag must stay unset until one succeeds.
    catalog.notifier.fail_next(2);

    for i in 0..5 {
        // Same title every time: each create after the first hits the slug retry.
        let mut new = project("Same Title");
        if i >= 2 {
            new.title = format!("Another {i}");
        }
        catalog.projects.create(&owner, new).await.unwrap();
    }

    assert_eq!(catalog.notifier.welcomes_for(owner.id), 1);
    let profile = catalog.owners.get(owner.id).await.unwrap().unwrap();
    assert!(profile.welcome_sent);
    assert_eq!(profile.role, Role::Developer);
}

#[tokio::test]
async fn slug_collision_retries_once_with_suffix() {
    let catalog = Catalog::new(vec![]);
    let owner = catalog.register_owner("dev");

    let first = catalog.projects.create(&owner, project("Star Forge")).await.unwrap();
    let second = catalog.projects.create(&owner, project("Star Forge")).await.unwrap();
    assert_eq!(first.slug, "star-forge");
    assert!(second.slug.starts_with("star-forge-"));
    assert_ne!(first.slug, second.slug);
}

#[tokio::test]
async fn claim_at_creation_must_be_unclaimed_and_existing() {
    let catalog = Catalog::new(vec![legacy_entry("42", hours_ago(1))]);
    let owner = catalog.register_owner("dev");

    let mut new = project("Cool Game");
    new.claimed_legacy_id = Some("404".into());
    let err = catalog.projects.create(&owner, new).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let mut new = project("Cool Game");
    new.claimed_legacy_id = Some("42".into());
    new.publish = true;
    let record = catalog.projects.create(&owner, new).await.unwrap();
    assert_eq!(record.status, RecordStatus::Published);
    assert!(record.published_at.is_some());

    let mut duplicate = project("Cool Game Again");
    duplicate.claimed_legacy_id = Some("42".into());
    let err = catalog.projects.create(&owner, duplicate).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn only_the_owner_edits() {
    let catalog = Catalog::new(vec![]);
    let owner = catalog.register_owner("dev");
    let stranger = catalog.register_owner("stranger");
    let record = catalog.projects.create(&owner, project("Mine")).await.unwrap();

    let patch = services::RecordPatch { title: Some("Theirs".into()), ..Default::default() };
    let err = catalog.projects.edit(record.id, patch.clone(), &stranger).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let edited = catalog.projects.edit(record.id, patch, &owner).await.unwrap();
    assert_eq!(edited.title, "Theirs");
    // Slugs are stable across edits.
    assert_eq!(edited.slug, "mine");
}

#[tokio::test]
async fn first_time_owner_is_registered_promoted_and_welcomed() {
    let catalog = Catalog::new(vec![]);
    // Verified upstream but never seen by the owner directory.
    let owner = Actor { id: Uuid::now_v7(), name: "stranger".into(), role: Role::User };

    catalog.projects.create(&owner, project("Hello World")).await.unwrap();
    catalog.projects.create(&owner, project("Second Thing")).await.unwrap();

    let profile = catalog.owners.get(owner.id).await.unwrap().unwrap();
    assert_eq!(profile.display_name, "stranger");
    assert_eq!(profile.role, Role::Developer);
    assert!(profile.welcome_sent);
    assert_eq!(catalog.notifier.welcomes_for(owner.id), 1);
}
