//! Mod lookup: full-text search against the catalog and name resolution
//! for command arguments.
//!
//! Supports plain text search (matches slug, name and summary) and regex
//! search when the query is wrapped in /slashes/.

use regex::Regex;

use mp_core::{Error, Mod, ModId, Profile};

use crate::catalog::CatalogClient;

/// Search result with relevance scoring.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub mod_id: ModId,
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub score: u32,
}

/// Run a catalog search and rank the results.
pub async fn search_mods(
    catalog: &dyn CatalogClient,
    query: &str,
) -> Result<Vec<SearchHit>, Error> {
    let query = query.trim();

    // Regex queries are filtered client-side; the catalog gets the bare
    // pattern as its search term.
    let is_regex = query.starts_with('/') && query.ends_with('/') && query.len() > 2;
    let term = if is_regex {
        &query[1..query.len() - 1]
    } else {
        query
    };

    let mods = catalog.search(term).await?;

    let mut hits: Vec<SearchHit> = if is_regex {
        match Regex::new(term) {
            Ok(re) => mods
                .iter()
                .filter(|m| {
                    re.is_match(&m.name)
                        || re.is_match(&m.slug)
                        || m.summary.as_deref().is_some_and(|s| re.is_match(s))
                })
                .map(|m| hit(m, 25))
                .collect(),
            Err(_) => score_by_text(&mods, term),
        }
    } else {
        score_by_text(&mods, term)
    };

    hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.slug.cmp(&b.slug)));
    Ok(hits)
}

fn hit(m: &Mod, score: u32) -> SearchHit {
    SearchHit {
        mod_id: m.id,
        slug: m.slug.clone(),
        name: m.name.clone(),
        summary: m.summary.clone().unwrap_or_default(),
        score,
    }
}

fn score_by_text(mods: &[Mod], query: &str) -> Vec<SearchHit> {
    let query_lower = query.to_lowercase();

    mods.iter()
        .filter_map(|m| {
            let slug_lower = m.slug.to_lowercase();
            let name_lower = m.name.to_lowercase();
            let summary_lower = m.summary.as_deref().unwrap_or("").to_lowercase();

            let score = if slug_lower == query_lower || name_lower == query_lower {
                100
            } else if slug_lower.starts_with(&query_lower) || name_lower.starts_with(&query_lower) {
                50
            } else if slug_lower.contains(&query_lower) || name_lower.contains(&query_lower) {
                25
            } else if summary_lower.contains(&query_lower) {
                10
            } else {
                0
            };

            if score > 0 { Some(hit(m, score)) } else { None }
        })
        .collect()
}

/// Resolve a user-typed mod argument to exactly one catalog mod.
///
/// An exact slug or name match wins outright; otherwise the query must
/// match a single mod. Ambiguity is reported with the candidates rather
/// than guessed at.
pub async fn find_remote_mod(catalog: &dyn CatalogClient, query: &str) -> Result<Mod, Error> {
    let mods = catalog.search(query).await?;

    let query_lower = query.to_lowercase();
    if let Some(exact) = mods
        .iter()
        .find(|m| m.slug.to_lowercase() == query_lower || m.name.to_lowercase() == query_lower)
    {
        return Ok(exact.clone());
    }

    let matching: Vec<&Mod> = mods
        .iter()
        .filter(|m| {
            m.slug.to_lowercase().contains(&query_lower)
                || m.name.to_lowercase().contains(&query_lower)
        })
        .collect();

    match matching.as_slice() {
        [single] => Ok((*single).clone()),
        [] => Err(Error::NotFound {
            what: format!("mod '{query}'"),
        }),
        many => Err(Error::NotFound {
            what: format!(
                "a unique mod for '{query}' (candidates: {})",
                many.iter()
                    .map(|m| m.slug.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
    }
}

/// Resolve a user-typed mod argument against the installed profile.
///
/// Accepts a numeric identifier or a slug; works without the catalog so
/// removal keeps working for mods that vanished from the remote side.
pub fn find_installed(profile: &Profile, query: &str) -> Result<ModId, Error> {
    if let Ok(id) = query.parse::<ModId>()
        && profile.is_installed(id)
    {
        return Ok(id);
    }

    let query_lower = query.to_lowercase();
    if let Some(rec) = profile
        .mods
        .values()
        .find(|rec| rec.slug.to_lowercase() == query_lower)
    {
        return Ok(rec.mod_id);
    }

    let matching: Vec<ModId> = profile
        .mods
        .values()
        .filter(|rec| rec.slug.to_lowercase().contains(&query_lower))
        .map(|rec| rec.mod_id)
        .collect();

    match matching.as_slice() {
        [single] => Ok(*single),
        _ => Err(Error::NotInstalled {
            name: query.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::InstalledMod;
    use std::collections::BTreeSet;

    fn profile_with(slugs: &[(u64, &str)]) -> Profile {
        let mut profile = Profile::new("1.10.2");
        for (id, slug) in slugs {
            profile.record(InstalledMod {
                mod_id: *id,
                slug: slug.to_string(),
                file_id: id * 10,
                version_label: "1.0".to_string(),
                file_name: format!("{slug}.jar"),
                direct: true,
                dependents: BTreeSet::new(),
            });
        }
        profile
    }

    #[test]
    fn find_installed_by_id_and_slug() {
        let profile = profile_with(&[(100, "iron-chests"), (50, "forge-multipart")]);

        assert_eq!(find_installed(&profile, "100").unwrap(), 100);
        assert_eq!(find_installed(&profile, "iron-chests").unwrap(), 100);
        assert_eq!(find_installed(&profile, "Forge-Multipart").unwrap(), 50);
    }

    #[test]
    fn find_installed_unique_fragment() {
        let profile = profile_with(&[(100, "iron-chests"), (50, "forge-multipart")]);
        assert_eq!(find_installed(&profile, "iron").unwrap(), 100);
    }

    #[test]
    fn find_installed_rejects_ambiguity_and_misses() {
        let profile = profile_with(&[(100, "iron-chests"), (101, "iron-tanks")]);

        assert!(matches!(
            find_installed(&profile, "iron"),
            Err(Error::NotInstalled { .. })
        ));
        assert!(matches!(
            find_installed(&profile, "quark"),
            Err(Error::NotInstalled { .. })
        ));
    }

    #[test]
    fn scoring_prefers_exact_slug() {
        let mods = vec![
            Mod {
                id: 1,
                slug: "iron-chests".to_string(),
                name: "Iron Chests".to_string(),
                summary: Some("More chests".to_string()),
            },
            Mod {
                id: 2,
                slug: "iron-chests-extras".to_string(),
                name: "Iron Chests Extras".to_string(),
                summary: None,
            },
        ];

        let hits = score_by_text(&mods, "iron-chests");
        assert_eq!(hits[0].mod_id, 1);
        assert!(hits[0].score > hits[1].score);
    }
}
