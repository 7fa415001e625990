//! Behavioural tests for the MongoDB student repository.
//!
//! These run against a live server named by `STUDENTS_TEST_MONGODB_URL` and
//! are skipped when the variable is unset. Each test works in its own
//! throwaway database.

use mongodb::Client;
use mongodb::bson::{self, doc, oid::ObjectId};
use rstest::rstest;
use student_records::domain::ports::{StudentRepository, StudentRepositoryError};
use student_records::domain::{NewStudent, StudentChanges, StudentId};
use student_records::outbound::persistence::{
    MongoStudentRepository, STUDENTS_COLLECTION, StoreClient, StoreConfig,
};
use uuid::Uuid;

const URL_VAR: &str = "STUDENTS_TEST_MONGODB_URL";

struct TestDatabase {
    url: String,
    name: String,
    store: StoreClient,
    repository: MongoStudentRepository,
}

impl TestDatabase {
    async fn cleanup(self) {
        let Self {
            url,
            name,
            store,
            repository,
        } = self;
        drop(repository);
        store.shutdown().await;

        let client = Client::with_uri_str(&url)
            .await
            .expect("client for cleanup");
        client
            .database(&name)
            .drop()
            .await
            .expect("drop test database");
    }
}

async fn test_database() -> Option<TestDatabase> {
    let Ok(url) = std::env::var(URL_VAR) else {
        eprintln!("SKIP-TEST-CLUSTER: {URL_VAR} is not set");
        return None;
    };
    let name = format!("student_records_test_{}", Uuid::new_v4().simple());
    let config = StoreConfig::new(url.clone()).with_database(name.clone());
    let store = StoreClient::connect(&config)
        .await
        .expect("connect to test server");
    let repository = MongoStudentRepository::new(&store);
    repository.ensure_indexes().await.expect("create indexes");
    Some(TestDatabase {
        url,
        name,
        store,
        repository,
    })
}

fn new_student(name: &str, email: Option<&str>) -> NewStudent {
    NewStudent::try_from_parts(
        Some(name.to_owned()),
        Some(12),
        Some("6th".to_owned()),
        email.map(str::to_owned),
    )
    .expect("valid student")
}

#[rstest]
#[tokio::test]
async fn crud_round_trip() {
    let Some(db) = test_database().await else {
        return;
    };
    let repo = &db.repository;

    assert!(repo.list().await.expect("list").is_empty());

    let created = repo
        .insert(&new_student("Alice", None))
        .await
        .expect("insert");
    let fetched = repo
        .find_by_id(created.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(fetched, created);

    let changes =
        StudentChanges::try_from_parts(None, Some(13), None, None).expect("valid changes");
    let updated = repo
        .update(created.id(), &changes)
        .await
        .expect("update")
        .expect("present");
    assert_eq!(updated.age().years(), 13);
    assert_eq!(updated.name(), created.name());

    assert!(repo.delete(created.id()).await.expect("delete"));
    assert!(!repo.delete(created.id()).await.expect("second delete"));
    assert!(repo.find_by_id(created.id()).await.expect("find").is_none());

    db.cleanup().await;
}

#[rstest]
#[tokio::test]
async fn update_of_unknown_id_does_not_upsert() {
    let Some(db) = test_database().await else {
        return;
    };
    let id = StudentId::new("ffffffffffffffffffffffff").expect("valid id");
    let changes =
        StudentChanges::try_from_parts(Some("Ghost".to_owned()), None, None, None)
            .expect("valid changes");

    let result = db.repository.update(&id, &changes).await.expect("update");

    assert!(result.is_none());
    assert!(db.repository.list().await.expect("list").is_empty());
    db.cleanup().await;
}

#[rstest]
#[tokio::test]
async fn duplicate_email_is_rejected_but_missing_emails_coexist() {
    let Some(db) = test_database().await else {
        return;
    };
    let repo = &db.repository;
    repo.insert(&new_student("Alice", Some("alice@example.com")))
        .await
        .expect("first insert");
    repo.insert(&new_student("Bob", None)).await.expect("no email");
    repo.insert(&new_student("Carol", None))
        .await
        .expect("second record without email");

    let duplicate = repo
        .insert(&new_student("Alicia", Some("alice@example.com")))
        .await
        .expect_err("duplicate email");

    assert_eq!(
        duplicate,
        StudentRepositoryError::duplicate_email("alice@example.com")
    );
    assert_eq!(repo.list().await.expect("list").len(), 3);
    db.cleanup().await;
}

#[rstest]
#[tokio::test]
async fn malformed_stored_documents_fail_reads() {
    let Some(db) = test_database().await else {
        return;
    };
    let repo = &db.repository;
    repo.insert(&new_student("Alice", None)).await.expect("insert");

    let oid = ObjectId::new();
    Client::with_uri_str(&db.url)
        .await
        .expect("raw client")
        .database(&db.name)
        .collection::<bson::Document>(STUDENTS_COLLECTION)
        .insert_one(doc! {
            "_id": oid,
            "name": "Mallory",
            "age": "twelve",
            "grade": "6th",
            "createdAt": bson::DateTime::now(),
        })
        .await
        .expect("raw insert");
    let id = StudentId::new(oid.to_hex()).expect("valid id");

    let listed = repo.list().await.expect_err("type mismatch");
    let found = repo.find_by_id(&id).await.expect_err("type mismatch");

    assert!(matches!(listed, StudentRepositoryError::Query { .. }));
    assert!(matches!(found, StudentRepositoryError::Query { .. }));
    db.cleanup().await;
}
