use deunicode::deunicode;
use scraper::{Html, Selector};

use crate::tune::NO_SCORE;

/// Pull the tune's transcription out of a detail page.
///
/// Takes the text of the first `<pre>` element that has any text, decodes
/// entities, and transliterates it to ASCII. Pages without one yield
/// [`NO_SCORE`].
pub fn extract_transcription(html: &str) -> String {
    let document = Html::parse_document(html);
    let pre = Selector::parse("pre").unwrap();

    document
        .select(&pre)
        .map(|el| el.text().collect::<String>())
        .find(|text| !text.is_empty())
        .map(|text| deunicode(&text))
        .unwrap_or_else(|| NO_SCORE.to_string())
}
