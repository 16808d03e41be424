mod common;

use checkout_core::{Entity, ProductId};
use checkout_infra::{PersistenceCause, ProductRepository, Repository, RepositoryError};

use common::{database, product};

#[tokio::test]
async fn create_find_and_update() {
    let db = database().await;
    let repo = ProductRepository::new(db);
    let mut product = product("p1", 100);
    repo.create(&product).await.unwrap();

    assert_eq!(repo.find(product.id()).await.unwrap(), product);

    product.change_name("Renamed").unwrap();
    product.change_price(150);
    repo.update(&product).await.unwrap();

    let found = repo.find(product.id()).await.unwrap();
    assert_eq!(found.name(), "Renamed");
    assert_eq!(found.price(), 150);
}

#[tokio::test]
async fn find_all_lists_products_by_id() {
    let db = database().await;
    let repo = ProductRepository::new(db);
    repo.create(&product("p2", 200)).await.unwrap();
    repo.create(&product("p1", 100)).await.unwrap();

    let all = repo.find_all().await.unwrap();

    assert_eq!(all, vec![product("p1", 100), product("p2", 200)]);
}

#[tokio::test]
async fn missing_and_duplicate_products() {
    let db = database().await;
    let repo = ProductRepository::new(db);

    match repo.find(&ProductId::parse("nope").unwrap()).await.unwrap_err() {
        RepositoryError::NotFound { entity: "product", id } => assert_eq!(id, "nope"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    repo.create(&product("p1", 100)).await.unwrap();
    let err = repo.create(&product("p1", 100)).await.unwrap_err();
    assert_eq!(err.persistence_cause(), Some(PersistenceCause::DuplicateKey));
}
