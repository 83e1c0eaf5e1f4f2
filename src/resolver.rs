//! Product identifier resolution.
//!
//! Callers pass whatever the client sent in `product_id`: a slug, a numeric
//! id (as number or string), a partial name, or a composite token such as
//! `"beverage-42"`. Resolution walks a fixed priority chain and degrades to
//! a best-effort match or none; it never fails on ambiguity.

use std::str::FromStr;

use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::entity::products::{Column as ProductCol, Entity as Products, Model as ProductModel};

/// Loosely-typed product identifier as it appears in request bodies.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ProductKey {
    Id(i64),
    Text(String),
}

impl ProductKey {
    /// Normalized text form used by the lookup chain.
    pub fn as_text(&self) -> String {
        match self {
            ProductKey::Id(id) => id.to_string(),
            ProductKey::Text(raw) => raw.trim().to_string(),
        }
    }
}

/// What to do when a substring search matches several products and none of
/// them equals the identifier outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Deterministic best-effort: take the candidate with the lowest id.
    #[default]
    LowestId,
    /// Treat the ambiguity as "not found".
    Reject,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "lowest_id" => Ok(MatchPolicy::LowestId),
            "reject" => Ok(MatchPolicy::Reject),
            other => Err(format!("unknown match policy '{other}', expected lowest_id or reject")),
        }
    }
}

/// Resolve an identifier to a product. Read-only; `Ok(None)` means no match.
///
/// Priority: exact slug, case-insensitive slug, numeric id, substring on
/// slug/name, separator heuristics. Candidate sets are always ordered by
/// ascending id so repeated lookups return the same row.
pub async fn resolve_product<C: ConnectionTrait>(
    conn: &C,
    key: &ProductKey,
    policy: MatchPolicy,
) -> Result<Option<ProductModel>, DbErr> {
    let ident = key.as_text();
    if ident.is_empty() {
        return Ok(None);
    }

    if let Some(product) = Products::find()
        .filter(ProductCol::Slug.eq(ident.as_str()))
        .one(conn)
        .await?
    {
        tracing::debug!(identifier = %ident, product_id = product.id, "resolved by exact slug");
        return Ok(Some(product));
    }

    if let Some(product) = Products::find()
        .filter(Expr::expr(Func::lower(Expr::col(ProductCol::Slug))).eq(ident.to_lowercase()))
        .order_by_asc(ProductCol::Id)
        .one(conn)
        .await?
    {
        tracing::debug!(identifier = %ident, product_id = product.id, "resolved by slug, case-insensitive");
        return Ok(Some(product));
    }

    if let Ok(id) = ident.parse::<i64>() {
        if let Some(product) = Products::find_by_id(id).one(conn).await? {
            tracing::debug!(identifier = %ident, "resolved by numeric id");
            return Ok(Some(product));
        }
    }

    let candidates = substring_search(conn, &ident).await?;
    if let Some(product) = pick_candidate(&ident, candidates, policy) {
        return Ok(Some(product));
    }

    for (prefix, suffix) in split_heuristics(&ident) {
        if let Ok(id) = suffix.parse::<i64>() {
            if let Some(product) = Products::find_by_id(id).one(conn).await? {
                tracing::debug!(identifier = %ident, suffix = %suffix, "resolved by numeric suffix");
                return Ok(Some(product));
            }
        }
        if prefix.is_empty() {
            continue;
        }
        let mut found = substring_search(conn, &prefix).await?;
        if !found.is_empty() {
            let product = found.remove(0);
            tracing::debug!(identifier = %ident, prefix = %prefix, product_id = product.id, "resolved by prefix search");
            return Ok(Some(product));
        }
    }

    tracing::debug!(identifier = %ident, "no product match");
    Ok(None)
}

async fn substring_search<C: ConnectionTrait>(
    conn: &C,
    term: &str,
) -> Result<Vec<ProductModel>, DbErr> {
    let pattern = format!("%{term}%");
    Products::find()
        .filter(
            Condition::any()
                .add(Expr::col(ProductCol::Slug).ilike(pattern.clone()))
                .add(Expr::col(ProductCol::Name).ilike(pattern)),
        )
        .order_by_asc(ProductCol::Id)
        .all(conn)
        .await
}

/// Tie-break a substring candidate set: a single hit wins, an exact
/// case-insensitive slug/name match wins among many, otherwise the policy
/// decides.
fn pick_candidate(
    ident: &str,
    candidates: Vec<ProductModel>,
    policy: MatchPolicy,
) -> Option<ProductModel> {
    if candidates.len() > 1 {
        if let Some(pos) = candidates
            .iter()
            .position(|c| c.slug.eq_ignore_ascii_case(ident) || c.name.eq_ignore_ascii_case(ident))
        {
            return candidates.into_iter().nth(pos);
        }
        tracing::warn!(
            identifier = %ident,
            count = candidates.len(),
            policy = ?policy,
            "ambiguous product identifier"
        );
        if policy == MatchPolicy::Reject {
            return None;
        }
    }
    candidates.into_iter().next()
}

/// (prefix, suffix) pairs for identifiers containing a separator, in the
/// order the separators are tried. Splitting keeps the first and last
/// segments, so `"a-b-2"` yields `("a", "2")`.
fn split_heuristics(ident: &str) -> Vec<(String, String)> {
    ["-", "_", ":"]
        .iter()
        .filter(|sep| ident.contains(*sep))
        .map(|sep| {
            let prefix = ident.split(*sep).next().unwrap_or("").trim().to_string();
            let suffix = ident.rsplit(*sep).next().unwrap_or("").trim().to_string();
            (prefix, suffix)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, slug: &str) -> ProductModel {
        ProductModel {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            price: rust_decimal::Decimal::new(1000, 2),
            stock: 10,
            image: None,
            category_id: None,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn product_key_accepts_numbers_and_strings() {
        let key: ProductKey = serde_json::from_str("42").unwrap();
        assert_eq!(key.as_text(), "42");
        let key: ProductKey = serde_json::from_str("\" peak-milk \"").unwrap();
        assert_eq!(key.as_text(), "peak-milk");
    }

    #[test]
    fn single_candidate_wins() {
        let found = pick_candidate("milk", vec![product(3, "Peak Milk", "peak-milk")], MatchPolicy::LowestId);
        assert_eq!(found.unwrap().id, 3);
    }

    #[test]
    fn exact_match_beats_position() {
        let candidates = vec![
            product(1, "Milky Way", "milky-way"),
            product(2, "Milk", "milk"),
        ];
        let found = pick_candidate("MILK", candidates, MatchPolicy::LowestId);
        assert_eq!(found.unwrap().id, 2);
    }

    #[test]
    fn lowest_id_policy_keeps_first() {
        let candidates = vec![
            product(1, "Milky Way", "milky-way"),
            product(2, "Milkshake", "milkshake"),
        ];
        let found = pick_candidate("milk", candidates, MatchPolicy::LowestId);
        assert_eq!(found.unwrap().id, 1);
    }

    #[test]
    fn reject_policy_drops_ambiguity() {
        let candidates = vec![
            product(1, "Milky Way", "milky-way"),
            product(2, "Milkshake", "milkshake"),
        ];
        assert!(pick_candidate("milk", candidates, MatchPolicy::Reject).is_none());
    }

    #[test]
    fn split_keeps_first_and_last_segments() {
        assert_eq!(
            split_heuristics("beverage-2"),
            vec![("beverage".to_string(), "2".to_string())]
        );
        assert_eq!(
            split_heuristics("a-b-2"),
            vec![("a".to_string(), "2".to_string())]
        );
        assert_eq!(
            split_heuristics("cat_7"),
            vec![("cat".to_string(), "7".to_string())]
        );
        assert!(split_heuristics("plain").is_empty());
    }

    #[test]
    fn match_policy_parses() {
        assert_eq!("lowest_id".parse::<MatchPolicy>().unwrap(), MatchPolicy::LowestId);
        assert_eq!("reject".parse::<MatchPolicy>().unwrap(), MatchPolicy::Reject);
        assert!("first".parse::<MatchPolicy>().is_err());
    }
}
