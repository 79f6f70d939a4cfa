//! エンドポイントとURL組み立て

use url::form_urlencoded;

use crate::config::HarvestConfig;

pub const LISTING_PATH: &str = "/web-api/tpmodels/games/1";
pub const OPTIONS_PATH: &str = "/web-api/tpmodels/options/1";
pub const DEMO_LINK_PATH: &str = "/web-api/tpgamesopening/getgameurl";

const OPTIONS_KEYS: &str = "brands,subcategories,banners";

fn build_url(base_url: &str, path: &str, params: &[(&str, String)]) -> String {
    let base_url = base_url.trim_end_matches('/');
    if params.is_empty() {
        return format!("{}{}", base_url, path);
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{}{}?{}", base_url, path, query)
}

/// カタログのトップ（ウォームアップ先・Referer）
pub fn landing_url(base_url: &str, lang: &str) -> String {
    format!("{}/{}/slots", base_url.trim_end_matches('/'), lang)
}

/// ゲームの正規URL
pub fn game_page_url(base_url: &str, lang: &str, game_id: i64) -> String {
    format!("{}?game={}", landing_url(base_url, lang), game_id)
}

pub fn options_url(base_url: &str) -> String {
    build_url(
        base_url,
        OPTIONS_PATH,
        &[("optionsKeys", OPTIONS_KEYS.to_string())],
    )
}

/// 一覧APIの1ページ分のURL。パラメータは空でも常に送る
pub fn listing_url(config: &HarvestConfig, category: Option<i64>, offset: u64) -> String {
    let brand_ids = config
        .brand_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let params = [
        ("brandIds", brand_ids),
        (
            "categoriesId",
            category.map(|c| c.to_string()).unwrap_or_default(),
        ),
        ("limit", config.page_size.to_string()),
        ("offset", offset.to_string()),
        (
            "titleSearch",
            config.title_search.clone().unwrap_or_default(),
        ),
        ("withoutCdn", "true".to_string()),
        ("filterType", "or".to_string()),
    ];

    build_url(&config.base_url, LISTING_PATH, &params)
}

/// デモ起動リンク取得API。launchDomainはベースURLのホスト名
pub fn demo_link_url(base_url: &str, game_id: i64) -> String {
    let host = url::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    build_url(
        base_url,
        DEMO_LINK_PATH,
        &[
            ("demo", "true".to_string()),
            ("id", game_id.to_string()),
            ("withGameInfo", "true".to_string()),
            ("sectionId", "1".to_string()),
            ("launchDomain", format!("{}/", host)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url_unfiltered() {
        let config = HarvestConfig::new("https://example.com/", "en").with_page_size(50);
        let url = listing_url(&config, None, 100);
        assert_eq!(
            url,
            "https://example.com/web-api/tpmodels/games/1?brandIds=&categoriesId=&limit=50&offset=100&titleSearch=&withoutCdn=true&filterType=or"
        );
    }

    #[test]
    fn test_listing_url_with_filters() {
        let config = HarvestConfig::new("https://example.com", "en")
            .with_page_size(10)
            .with_brand_ids(vec![3, 12])
            .with_title_search(Some("book of ra".to_string()));
        let url = listing_url(&config, Some(42), 0);
        assert!(url.contains("brandIds=3%2C12"));
        assert!(url.contains("categoriesId=42"));
        assert!(url.contains("titleSearch=book+of+ra"));
        assert!(url.contains("limit=10&offset=0"));
    }

    #[test]
    fn test_options_and_landing_urls() {
        assert_eq!(
            options_url("https://example.com"),
            "https://example.com/web-api/tpmodels/options/1?optionsKeys=brands%2Csubcategories%2Cbanners"
        );
        assert_eq!(
            landing_url("https://example.com/", "de"),
            "https://example.com/de/slots"
        );
        assert_eq!(
            game_page_url("https://example.com", "en", 77),
            "https://example.com/en/slots?game=77"
        );
    }

    #[test]
    fn test_demo_link_url_uses_host() {
        let url = demo_link_url("https://melbet-tn.com", 9);
        assert!(url.starts_with("https://melbet-tn.com/web-api/tpgamesopening/getgameurl?demo=true&id=9"));
        assert!(url.ends_with("launchDomain=melbet-tn.com%2F"));
    }
}
