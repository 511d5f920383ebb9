//! Content reference URLs.
//!
//! Three request kinds are referenced from a tileset:
//!
//! - `getTile?city=&layer=&tile=&representation=&depth=[&onlyTiles=][&withoutFeatures=]`
//! - `getFeature?city=&layer=&id=&representation=`
//! - `getScene?city=&layer=&tile=&depth=&rules=`

use urlencoding::encode;

use crate::store::{FeatureId, TileId};

/// URL builder bound to one city layer and rule set.
#[derive(Debug, Clone, Copy)]
pub struct ContentUrls<'a> {
    city: &'a str,
    layer: &'a str,
    rules: &'a str,
}

impl<'a> ContentUrls<'a> {
    pub fn new(city: &'a str, layer: &'a str, rules: &'a str) -> Self {
        Self { city, layer, rules }
    }

    /// Tile content in one representation.
    ///
    /// `only_tiles` restricts the content to a subset of tiles and
    /// `without_features` excludes features drawn in their own branches.
    /// Empty lists are omitted.
    pub fn tile(
        &self,
        tile: TileId,
        representation: &str,
        depth: u32,
        only_tiles: &[TileId],
        without_features: &[FeatureId],
    ) -> String {
        let mut url = format!(
            "getTile?city={}&layer={}&tile={}&representation={}&depth={}",
            encode(self.city),
            encode(self.layer),
            tile,
            encode(representation),
            depth
        );
        if !only_tiles.is_empty() {
            url.push_str("&onlyTiles=");
            url.push_str(&join_ids(only_tiles));
        }
        if !without_features.is_empty() {
            url.push_str("&withoutFeatures=");
            url.push_str(&join_ids(without_features));
        }
        url
    }

    /// A single feature in one representation.
    pub fn feature(&self, feature: FeatureId, representation: &str) -> String {
        format!(
            "getFeature?city={}&layer={}&id={}&representation={}",
            encode(self.city),
            encode(self.layer),
            feature,
            encode(representation)
        )
    }

    /// A deferred scene for the subtree of `tile`, compiled with the same
    /// rules.
    ///
    /// `starting_depth` is the depth of the continuation's roots, one below
    /// `tile` itself.
    pub fn scene(&self, tile: TileId, starting_depth: u32) -> String {
        format!(
            "getScene?city={}&layer={}&tile={}&depth={}&rules={}",
            encode(self.city),
            encode(self.layer),
            tile,
            starting_depth,
            encode(self.rules)
        )
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_plain() {
        let urls = ContentUrls::new("c", "l", "{}");
        assert_eq!(
            urls.tile(1, "facade", 0, &[], &[]),
            "getTile?city=c&layer=l&tile=1&representation=facade&depth=0"
        );
    }

    #[test]
    fn test_tile_url_with_partial_and_features() {
        let urls = ContentUrls::new("lyon", "buildings", "{}");
        assert_eq!(
            urls.tile(12, "facade", 2, &[31, 33], &[7]),
            "getTile?city=lyon&layer=buildings&tile=12&representation=facade&depth=2\
             &onlyTiles=31,33&withoutFeatures=7"
        );
    }

    #[test]
    fn test_tile_url_without_features_only() {
        let urls = ContentUrls::new("c", "l", "{}");
        assert_eq!(
            urls.tile(3, "facade", 1, &[], &[8, 9]),
            "getTile?city=c&layer=l&tile=3&representation=facade&depth=1&withoutFeatures=8,9"
        );
    }

    #[test]
    fn test_feature_url() {
        let urls = ContentUrls::new("c", "l", "{}");
        assert_eq!(
            urls.feature(42, "textured"),
            "getFeature?city=c&layer=l&id=42&representation=textured"
        );
    }

    #[test]
    fn test_scene_url_encodes_rules() {
        let urls = ContentUrls::new("c", "l", r#"{"default":{}}"#);
        assert_eq!(
            urls.scene(5, 1),
            "getScene?city=c&layer=l&tile=5&depth=1&rules=%7B%22default%22%3A%7B%7D%7D"
        );
    }

    #[test]
    fn test_names_are_encoded() {
        let urls = ContentUrls::new("new york", "l", "{}");
        assert!(urls.feature(1, "a&b").starts_with("getFeature?city=new%20york&"));
        assert!(urls.feature(1, "a&b").ends_with("representation=a%26b"));
    }
}
