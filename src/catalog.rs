//! Product catalog for the sale register.
//!
//! The register page embeds the sellable products (stock > 0) as a JSON
//! array inside the element with id `produtos-data`. The catalog is read
//! once per session; prices and stock are not refreshed afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Element id carrying the embedded catalog on the register page.
pub const EMBEDDED_CATALOG_ID: &str = "produtos-data";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("embedded catalog is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco")]
    pub price: Decimal,
    #[serde(rename = "estoque", default)]
    pub stock: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse the catalog embedded in the register page HTML.
    ///
    /// A page without the element sells nothing: the catalog is empty.
    pub fn from_embedded_page(html: &str) -> Result<Self, CatalogError> {
        let Some(raw) = embedded_element_text(html, EMBEDDED_CATALOG_ID) else {
            warn!("Register page has no `{EMBEDDED_CATALOG_ID}` element, catalog is empty");
            return Ok(Self::default());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        // Templates that do not mark the payload safe entity-escape the quotes.
        let products: Vec<Product> = match serde_json::from_str(trimmed) {
            Ok(products) => products,
            Err(_) => serde_json::from_str(&unescape_html(trimmed))?,
        };
        Ok(Self { products })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Case-insensitive substring search over product names.
    ///
    /// No accent folding is applied: `"agua"` does not match `"Água"`.
    pub fn search(&self, term: &str) -> SearchResults<'_> {
        SearchResults {
            products: &self.products,
            needle: term.trim().to_lowercase(),
        }
    }
}

/// Matches for one search term.
///
/// Lazy and restartable: nothing is evaluated until [`SearchResults::iter`]
/// is called, and every call walks the catalog again.
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    products: &'a [Product],
    needle: String,
}

impl<'a> SearchResults<'a> {
    /// An empty term hides the result panel entirely.
    pub fn is_suppressed(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn term(&self) -> &str {
        &self.needle
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Product> + '_ {
        let suppressed = self.is_suppressed();
        let products: &'a [Product] = self.products;
        products
            .iter()
            .filter(move |p| !suppressed && p.name.to_lowercase().contains(&self.needle))
    }
}

/// Text content of the first element carrying `id="{id}"`.
///
/// The content runs up to the closing tag of that element (`</script`),
/// so a stray `</` inside the payload does not end it.
fn embedded_element_text<'a>(html: &'a str, id: &str) -> Option<&'a str> {
    let markers = [format!("id=\"{id}\""), format!("id='{id}'")];
    let attr_pos = markers.iter().find_map(|m| html.find(m.as_str()))?;
    let tag_start = html[..attr_pos].rfind('<')? + 1;
    let tag: String = html[tag_start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if tag.is_empty() {
        return None;
    }

    let open_end = attr_pos + html[attr_pos..].find('>')? + 1;
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let body = html[open_end..].to_ascii_lowercase();
    let close = open_end + body.find(&format!("</{tag}"))?;
    Some(&html[open_end..close])
}

fn unescape_html(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, price_cents: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price: Decimal::new(price_cents, 2),
            stock: 10,
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_products(vec![
            product(1, "Água", 500),
            product(2, "Pão Francês", 75),
            product(3, "Pão de Queijo", 350),
            product(4, "Café", 1200),
        ])
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let catalog = sample_catalog();
        let results = catalog.search("PÃO");
        let ids: Vec<i64> = results.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_search_has_no_accent_folding() {
        let catalog = sample_catalog();
        assert_eq!(catalog.search("agua").iter().count(), 0);
        assert_eq!(catalog.search("água").iter().count(), 1);
    }

    #[test]
    fn test_search_matches_exact_subset() {
        let catalog = sample_catalog();
        for term in ["a", "ão", "queijo", "zzz", "é"] {
            let expected: Vec<i64> = catalog
                .products()
                .iter()
                .filter(|p| p.name.to_lowercase().contains(term))
                .map(|p| p.id)
                .collect();
            let got: Vec<i64> = catalog.search(term).iter().map(|p| p.id).collect();
            assert_eq!(got, expected, "term {term}");
        }
    }

    #[test]
    fn test_empty_term_is_suppressed() {
        let catalog = sample_catalog();
        let results = catalog.search("   ");
        assert!(results.is_suppressed());
        assert_eq!(results.iter().count(), 0);
    }

    #[test]
    fn test_search_results_are_restartable() {
        let catalog = sample_catalog();
        let results = catalog.search("pão");
        assert_eq!(results.iter().count(), 2);
        assert_eq!(results.iter().count(), 2);
        let cloned = results.clone();
        assert_eq!(cloned.iter().next().map(|p| p.id), Some(2));
    }

    #[test]
    fn test_from_embedded_page_reads_script_payload() {
        let html = r#"<html><body>
            <script id="produtos-data" type="application/json">[{"id": 1, "nome": "Água", "preco": 5.0, "estoque": 10}]</script>
        </body></html>"#;
        let catalog = Catalog::from_embedded_page(html).unwrap();
        assert_eq!(catalog.len(), 1);
        let agua = catalog.get(1).unwrap();
        assert_eq!(agua.name, "Água");
        assert_eq!(agua.price, Decimal::new(500, 2));
        assert_eq!(agua.stock, 10);
    }

    #[test]
    fn test_from_embedded_page_accepts_entity_escaped_json() {
        let html = r#"<div id="produtos-data">[{&quot;id&quot;: 7, &quot;nome&quot;: &quot;Café&quot;, &quot;preco&quot;: 12.0, &quot;estoque&quot;: 3}]</div>"#;
        let catalog = Catalog::from_embedded_page(html).unwrap();
        assert_eq!(catalog.get(7).map(|p| p.name.as_str()), Some("Café"));
    }

    #[test]
    fn test_from_embedded_page_without_element_is_empty_catalog() {
        let catalog = Catalog::from_embedded_page("<html></html>").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_from_embedded_page_keeps_closing_markup_inside_names() {
        let html = r#"<script id="produtos-data">[{"id":1,"nome":"Cabo </> USB","preco":5.0,"estoque":10}]</SCRIPT><div>x</div>"#;
        let catalog = Catalog::from_embedded_page(html).unwrap();
        assert_eq!(catalog.get(1).map(|p| p.name.as_str()), Some("Cabo </> USB"));

        let html = r#"<div class="hidden" id='produtos-data'>[{"id":2,"nome":"Tag </b>","preco":1.0}]</div>"#;
        let catalog = Catalog::from_embedded_page(html).unwrap();
        assert_eq!(catalog.get(2).map(|p| p.name.as_str()), Some("Tag </b>"));
    }

    #[test]
    fn test_from_embedded_page_with_invalid_json_fails() {
        let err = Catalog::from_embedded_page(r#"<script id="produtos-data">[{"id":</script>"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidJson(_)));
    }

    #[test]
    fn test_from_embedded_page_with_empty_element_is_empty_catalog() {
        let catalog = Catalog::from_embedded_page(r#"<script id="produtos-data"></script>"#).unwrap();
        assert!(catalog.is_empty());
    }
}
