use scraper::Html;

/// Plain text of an HN comment body: tags dropped, entities decoded.
pub fn clean_comment(html: &str) -> String {
    let fragment = Html::parse_fragment(&format!("<div>{}</div>", html));
    fragment.root_element().text().collect()
}
