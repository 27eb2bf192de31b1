use serde::{Deserialize, Serialize};

/// Returned by the transcription fetcher when a detail page has no `<pre>` block.
pub const NO_SCORE: &str = "No Score";

/// Template text left in catalog entries nobody has transcribed yet.
pub const PLACEHOLDER: &str = "REPLACE THIS LINE WITH THE ABC CODE OF THIS TUNE";

/// One entry of a catalog result set. Any other printout fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTune {
    pub fulltext: String,
    pub fullurl: String,
}

/// A tune as written to the output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tune {
    pub name: String,
    pub url: String,
    pub transcription: String,
}

impl Tune {
    pub fn new(raw: RawTune, transcription: String) -> Self {
        Tune {
            name: raw.fulltext,
            url: raw.fullurl,
            transcription,
        }
    }

    pub fn has_transcription(&self) -> bool {
        !transcription_is_empty(&self.transcription)
    }
}

pub fn transcription_is_empty(transcription: &str) -> bool {
    transcription == NO_SCORE || transcription.contains(PLACEHOLDER)
}

/// Drops tunes whose transcription is missing or still the template text.
pub fn keep_transcribed(tunes: Vec<Tune>) -> Vec<Tune> {
    tunes.into_iter().filter(Tune::has_transcription).collect()
}
