// src/fetch/locator.rs

use std::path::PathBuf;
use url::Url;

use super::Variant;
use crate::error::FetchError;

const HF_DATASETS_PREFIX: &str = "hf://datasets/";

/// Where the bytes for one locator actually live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Http(Url),
    Local(PathBuf),
}

/// `<root>/data/<name>/<variant>.parquet`, with `name` exactly as it appears
/// in the catalog.
pub fn locator(root: &str, name: &str, variant: Variant) -> String {
    format!(
        "{}/data/{}/{}.parquet",
        root.trim_end_matches('/'),
        name,
        variant.as_str()
    )
}

/// Map a locator to an HTTP URL or a filesystem path.
///
/// `hf://datasets/<org>/<repo>[@<rev>]/<path>` resolves against `endpoint` as
/// `<endpoint>/datasets/<org>/<repo>/resolve/<rev>/<path>`, using `revision`
/// unless the locator pins one. Each path segment is percent-encoded.
pub fn resolve(locator: &str, endpoint: &str, revision: &str) -> Result<Resource, FetchError> {
    if let Some(rest) = locator.strip_prefix(HF_DATASETS_PREFIX) {
        return resolve_hf(locator, rest, endpoint, revision).map(Resource::Http);
    }
    if locator.starts_with("hf://") {
        return Err(invalid(locator, "only hf://datasets/ locators are supported"));
    }
    if locator.starts_with("http://") || locator.starts_with("https://") {
        return Url::parse(locator)
            .map(Resource::Http)
            .map_err(|e| invalid(locator, &e.to_string()));
    }
    Ok(Resource::Local(PathBuf::from(locator)))
}

fn resolve_hf(
    locator: &str,
    rest: &str,
    endpoint: &str,
    revision: &str,
) -> Result<Url, FetchError> {
    let mut parts = rest.splitn(3, '/');
    let org = parts.next().filter(|s| !s.is_empty());
    let repo = parts.next().filter(|s| !s.is_empty());
    let path = parts.next().filter(|s| !s.is_empty());
    let (org, repo, path) = match (org, repo, path) {
        (Some(o), Some(r), Some(p)) => (o, r, p),
        _ => {
            return Err(invalid(
                locator,
                "expected hf://datasets/<org>/<repo>/<path>",
            ))
        }
    };
    let (repo, revision) = match repo.split_once('@') {
        Some((repo, pinned)) if !pinned.is_empty() => (repo, pinned),
        Some(_) => return Err(invalid(locator, "empty revision after '@'")),
        None => (repo, revision),
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(endpoint, &e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid(endpoint, "endpoint cannot be a base URL"))?
        .pop_if_empty()
        .extend(["datasets", org, repo, "resolve", revision])
        .extend(path.split('/'));
    Ok(url)
}

fn invalid(locator: &str, reason: &str) -> FetchError {
    FetchError::Locator {
        locator: locator.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUB: &str = "https://huggingface.co";

    #[test]
    fn test_locator_uses_raw_name() {
        assert_eq!(
            locator("hf://datasets/cardiffnlp/databench", "006_London Airbnb-Listings", Variant::Sample),
            "hf://datasets/cardiffnlp/databench/data/006_London Airbnb-Listings/sample.parquet"
        );
        assert_eq!(
            locator("/srv/mirror/", "001_Forbes", Variant::All),
            "/srv/mirror/data/001_Forbes/all.parquet"
        );
    }

    #[test]
    fn test_resolve_hf_dataset() -> Result<(), FetchError> {
        let loc = locator("hf://datasets/cardiffnlp/databench", "001_Forbes", Variant::All);
        let resolved = resolve(&loc, HUB, "main")?;
        assert_eq!(
            resolved,
            Resource::Http(
                Url::parse(
                    "https://huggingface.co/datasets/cardiffnlp/databench/resolve/main/data/001_Forbes/all.parquet"
                )
                .unwrap()
            )
        );
        Ok(())
    }

    #[test]
    fn test_resolve_encodes_spaces() -> Result<(), FetchError> {
        let loc = locator("hf://datasets/org/repo", "London Airbnb", Variant::Sample);
        match resolve(&loc, HUB, "main")? {
            Resource::Http(url) => assert_eq!(
                url.path(),
                "/datasets/org/repo/resolve/main/data/London%20Airbnb/sample.parquet"
            ),
            other => panic!("expected http resource, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_resolve_pinned_revision_wins() -> Result<(), FetchError> {
        let resolved = resolve("hf://datasets/org/repo@v1.0/data/x/all.parquet", HUB, "main")?;
        match resolved {
            Resource::Http(url) => {
                assert_eq!(url.path(), "/datasets/org/repo/resolve/v1.0/data/x/all.parquet")
            }
            other => panic!("expected http resource, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_resolve_custom_endpoint_with_path() -> Result<(), FetchError> {
        let resolved = resolve("hf://datasets/o/r/a.parquet", "http://localhost:8080/hub/", "main")?;
        assert_eq!(
            resolved,
            Resource::Http(
                Url::parse("http://localhost:8080/hub/datasets/o/r/resolve/main/a.parquet").unwrap()
            )
        );
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_malformed_hf() {
        assert!(matches!(
            resolve("hf://datasets/only-org", HUB, "main"),
            Err(FetchError::Locator { .. })
        ));
        assert!(matches!(
            resolve("hf://models/org/repo/x.parquet", HUB, "main"),
            Err(FetchError::Locator { .. })
        ));
        assert!(matches!(
            resolve("hf://datasets/org/repo@/x.parquet", HUB, "main"),
            Err(FetchError::Locator { .. })
        ));
    }

    #[test]
    fn test_resolve_passthrough() -> Result<(), FetchError> {
        assert_eq!(
            resolve("https://example.com/data/a/all.parquet", HUB, "main")?,
            Resource::Http(Url::parse("https://example.com/data/a/all.parquet").unwrap())
        );
        assert_eq!(
            resolve("mirror/data/a/all.parquet", HUB, "main")?,
            Resource::Local(PathBuf::from("mirror/data/a/all.parquet"))
        );
        Ok(())
    }
}
