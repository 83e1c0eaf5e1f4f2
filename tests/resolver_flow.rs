mod common;

use axum_storefront_api::resolver::{MatchPolicy, ProductKey, resolve_product};

fn text(raw: &str) -> ProductKey {
    ProductKey::Text(raw.to_string())
}

// The resolver walks its priority chain against real catalog rows: exact
// slug, case-insensitive slug, numeric id, substring, separator heuristics.
#[tokio::test]
async fn resolver_priority_chain() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let coke = common::create_product(&state, "Coke 50cl", "coke-50cl", "12.50", 50).await?;
    let classic = common::create_product(&state, "Coke", "coke-classic", "10.00", 30).await?;
    let milkshake =
        common::create_product(&state, "Milkshake Mix", "milkshake-mix", "5.00", 10).await?;
    let milky_way =
        common::create_product(&state, "Milky Way Bar", "milky-way-bar", "2.00", 10).await?;
    let milk = common::create_product(&state, "Milk", "milk", "8.00", 10).await?;
    let gala = common::create_product(&state, "Gala Roll", "gala-roll", "3.25", 40).await?;

    let policy = MatchPolicy::LowestId;

    // 1. Exact slug wins outright.
    let found = resolve_product(&state.orm, &text("coke-50cl"), policy).await?;
    assert_eq!(found.unwrap().id, coke.id);

    // 2. Case-insensitive slug.
    let found = resolve_product(&state.orm, &text("MILK"), policy).await?;
    assert_eq!(found.unwrap().id, milk.id);

    // 3. Numeric id, both as number and as string.
    let found = resolve_product(&state.orm, &ProductKey::Id(milkshake.id), policy).await?;
    assert_eq!(found.unwrap().id, milkshake.id);
    let found = resolve_product(&state.orm, &text(&milky_way.id.to_string()), policy).await?;
    assert_eq!(found.unwrap().id, milky_way.id);

    // 4a. Substring with a single candidate.
    let found = resolve_product(&state.orm, &text("gala"), policy).await?;
    assert_eq!(found.unwrap().id, gala.id);

    // 4b. Several candidates; the one whose name equals the identifier
    // case-insensitively wins even with a higher id.
    let found = resolve_product(&state.orm, &text("coke"), policy).await?;
    assert_eq!(found.unwrap().id, classic.id);

    // 4c. Ambiguity without an exact match: lowest id under the default
    // policy, none under reject.
    let found = resolve_product(&state.orm, &text("mil"), policy).await?;
    assert_eq!(found.unwrap().id, milkshake.id);
    let found = resolve_product(&state.orm, &text("ilk"), MatchPolicy::Reject).await?;
    assert!(found.is_none());

    // 5. Separator heuristics: numeric suffix first, then prefix search.
    let found = resolve_product(&state.orm, &text(&format!("anything-{}", milk.id)), policy).await?;
    assert_eq!(found.unwrap().id, milk.id);
    let found = resolve_product(&state.orm, &text("gala_xyz"), policy).await?;
    assert_eq!(found.unwrap().id, gala.id);

    // 6. Misses resolve to none, not an error.
    assert!(
        resolve_product(&state.orm, &text("no-such-product-999999"), policy)
            .await?
            .is_none()
    );
    assert!(resolve_product(&state.orm, &text("   "), policy).await?.is_none());

    // Idempotence: the same identifier resolves to the same product.
    let a = resolve_product(&state.orm, &text("mil"), policy).await?.unwrap();
    let b = resolve_product(&state.orm, &text("mil"), policy).await?.unwrap();
    assert_eq!(a.id, b.id);

    Ok(())
}
