use std::future::Future;
use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::archive::TuneSource;
use crate::error::ArchiveError;
use crate::store;
use crate::theme::ThemeCode;
use crate::tune::{keep_transcribed, Tune};

/// Page size and per-code page cap.
#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub page_size: usize,
    pub max_pages_per_code: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Paging {
            page_size: 10,
            max_pages_per_code: 10,
        }
    }
}

/// Totals for one pagination run into one file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageRun {
    pub pages: usize,
    pub fetched: usize,
    pub kept: usize,
}

/// Totals for a theme code sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CodeRunStats {
    pub codes: usize,
    pub skipped: usize,
    pub scraped: usize,
    pub tunes: usize,
}

/// Fetch pages until one comes back short (or `max_pages` is hit),
/// rewriting `path` with everything kept so far after every page.
async fn paginate<F, Fut>(path: &Path, page_size: usize, max_pages: Option<usize>, mut fetch: F) -> Result<PageRun>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<Tune>, ArchiveError>>,
{
    let mut all: Vec<Tune> = Vec::new();
    let mut run = PageRun::default();

    for page in 0.. {
        if max_pages.is_some_and(|max| page >= max) {
            break;
        }

        let tunes = fetch(page).await?;
        let fetched = tunes.len();
        let kept = keep_transcribed(tunes);

        let new = kept.len();
        run.pages += 1;
        run.fetched += fetched;
        run.kept += new;
        all.extend(kept);

        info!(page, fetched, "Got {} more tunes, writing {} tunes to {:?}", new, all.len(), path);
        store::write_tunes(path, &all)?;

        if fetched < page_size {
            info!("Presuming that page of {} tunes is the last page", fetched);
            break;
        }
    }

    Ok(run)
}

/// Walk the whole catalog page by page into `tunes.json`.
pub async fn scrape_all<S: TuneSource>(source: &S, out_dir: &Path, page_size: usize) -> Result<PageRun> {
    let path = store::all_tunes_path(out_dir);
    paginate(&path, page_size, None, |page| source.page(page, page_size)).await
}

/// Scrape a single theme code into its own file, at most `max_pages_per_code` pages.
pub async fn scrape_code<S: TuneSource>(
    source: &S,
    out_dir: &Path,
    code: &ThemeCode,
    paging: Paging,
) -> Result<PageRun> {
    let path = store::code_path(out_dir, code);
    let page_size = paging.page_size;
    paginate(&path, page_size, Some(paging.max_pages_per_code), |page| {
        source.page_for_code(code, page, page_size)
    })
    .await
}

/// Scrape every code in `codes` that has no file yet. The first error ends the sweep.
pub async fn scrape_by_code<S, I>(source: &S, out_dir: &Path, codes: I, paging: Paging) -> Result<CodeRunStats>
where
    S: TuneSource,
    I: IntoIterator<Item = ThemeCode>,
{
    let mut stats = CodeRunStats::default();

    for code in codes {
        stats.codes += 1;
        if store::is_done(out_dir, &code) {
            stats.skipped += 1;
            continue;
        }

        info!(%code, "Requesting tunes with theme codes beginning in {}", code);
        let run = scrape_code(source, out_dir, &code, paging).await?;
        stats.scraped += 1;
        stats.tunes += run.kept;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::sync::Mutex;

    use reqwest::StatusCode;
    use tempfile::tempdir;

    use super::*;
    use crate::tune::{NO_SCORE, PLACEHOLDER};

    type Script = Box<dyn Fn(Option<&ThemeCode>, usize) -> Result<Vec<Tune>, ArchiveError>>;

    /// Answers pages from a script and remembers every request.
    struct Scripted {
        script: Script,
        calls: Mutex<Vec<(Option<String>, usize)>>,
    }

    impl Scripted {
        fn new(script: impl Fn(Option<&ThemeCode>, usize) -> Result<Vec<Tune>, ArchiveError> + 'static) -> Self {
            Scripted {
                script: Box::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Option<String>, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TuneSource for Scripted {
        async fn page(&self, page: usize, _page_size: usize) -> Result<Vec<Tune>, ArchiveError> {
            self.calls.lock().unwrap().push((None, page));
            (self.script)(None, page)
        }

        async fn page_for_code(
            &self,
            code: &ThemeCode,
            page: usize,
            _page_size: usize,
        ) -> Result<Vec<Tune>, ArchiveError> {
            self.calls.lock().unwrap().push((Some(code.to_string()), page));
            (self.script)(Some(code), page)
        }
    }

    fn tunes(page: usize, count: usize) -> Vec<Tune> {
        (0..count)
            .map(|i| Tune {
                name: format!("Tune {}-{}", page, i),
                url: format!("http://tunearch.org/wiki/Tune_{}_{}", page, i),
                transcription: format!("X:{}\nK:D", i),
            })
            .collect()
    }

    fn code(s: &str) -> ThemeCode {
        s.parse().unwrap()
    }

    fn throttled() -> ArchiveError {
        ArchiveError::Status {
            url: "http://tunearch.org/w/api.php".into(),
            status: StatusCode::TOO_MANY_REQUESTS,
        }
    }

    #[tokio::test]
    async fn global_run_drops_empty_transcriptions() {
        let source = Scripted::new(|_, page| match page {
            0 => Ok(tunes(0, 10)),
            _ => {
                let mut last = tunes(1, 4);
                last[2].transcription = NO_SCORE.into();
                Ok(last)
            }
        });
        let temp = tempdir().unwrap();

        let run = scrape_all(&source, temp.path(), 10).await.unwrap();

        assert_eq!(run, PageRun { pages: 2, fetched: 14, kept: 13 });
        assert_eq!(source.calls(), vec![(None, 0), (None, 1)]);
        let written = store::read_tunes(&store::all_tunes_path(temp.path())).unwrap();
        assert_eq!(written.len(), 13);
        assert!(written.iter().all(Tune::has_transcription));
        assert_eq!(written[10].name, "Tune 1-0");
        assert_eq!(written[12].name, "Tune 1-3");
    }

    #[tokio::test]
    async fn stops_after_first_short_page() {
        let source = Scripted::new(|_, page| Ok(if page < 3 { tunes(page, 10) } else { tunes(page, 9) }));
        let temp = tempdir().unwrap();

        let run = scrape_all(&source, temp.path(), 10).await.unwrap();

        let pages: Vec<usize> = source.calls().into_iter().map(|(_, p)| p).collect();
        assert_eq!(pages, vec![0, 1, 2, 3]);
        assert_eq!(run.kept, 39);
    }

    #[tokio::test]
    async fn empty_first_page_still_writes_file() {
        let source = Scripted::new(|_, _| Ok(Vec::new()));
        let temp = tempdir().unwrap();

        let run = scrape_all(&source, temp.path(), 10).await.unwrap();

        assert_eq!(run.pages, 1);
        let path = store::all_tunes_path(temp.path());
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn code_run_caps_at_ten_pages() {
        let source = Scripted::new(|_, page| Ok(tunes(page, 10)));
        let temp = tempdir().unwrap();
        let c = code("4444");

        let run = scrape_code(&source, temp.path(), &c, Paging::default()).await.unwrap();

        assert_eq!(source.calls().len(), 10);
        assert_eq!(run, PageRun { pages: 10, fetched: 100, kept: 100 });
        assert_eq!(store::read_tunes(&store::code_path(temp.path(), &c)).unwrap().len(), 100);
    }

    #[tokio::test]
    async fn placeholder_only_code_writes_empty_array() {
        let source = Scripted::new(|_, page| {
            let mut page_tunes = tunes(page, 2);
            for t in &mut page_tunes {
                t.transcription = format!("X:1\n{}", PLACEHOLDER);
            }
            Ok(page_tunes)
        });
        let temp = tempdir().unwrap();
        let c = code("1234");

        let run = scrape_code(&source, temp.path(), &c, Paging::default()).await.unwrap();

        assert_eq!(run, PageRun { pages: 1, fetched: 2, kept: 0 });
        assert!(store::is_done(temp.path(), &c));
        assert!(store::read_tunes(&store::code_path(temp.path(), &c)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_code_files_are_skipped() {
        let temp = tempdir().unwrap();
        let done = code("1111");
        let done_path = store::code_path(temp.path(), &done);
        store::write_tunes(&done_path, &tunes(9, 1)).unwrap();
        let before = fs::read(&done_path).unwrap();

        let source = Scripted::new(|_, page| Ok(tunes(page, 3)));
        let stats = scrape_by_code(&source, temp.path(), vec![done, code("1112")], Paging::default())
            .await
            .unwrap();

        assert_eq!(stats, CodeRunStats { codes: 2, skipped: 1, scraped: 1, tunes: 3 });
        assert_eq!(source.calls(), vec![(Some("1112".to_string()), 0)]);
        assert_eq!(fs::read(&done_path).unwrap(), before);
    }

    #[tokio::test]
    async fn rerun_over_complete_output_makes_no_requests() {
        let temp = tempdir().unwrap();
        let mut before = BTreeMap::new();
        for (i, c) in ThemeCode::all().enumerate() {
            let path = store::code_path(temp.path(), &c);
            store::write_tunes(&path, &tunes(i, i % 3)).unwrap();
            before.insert(path.clone(), fs::read(&path).unwrap());
        }

        let source = Scripted::new(|_, _| panic!("no request expected"));
        let stats = scrape_by_code(&source, temp.path(), ThemeCode::all(), Paging::default())
            .await
            .unwrap();

        assert!(source.calls().is_empty());
        assert_eq!(stats.skipped, crate::theme::CODE_COUNT);
        for (path, bytes) in before {
            assert_eq!(fs::read(&path).unwrap(), bytes, "{:?} changed", path);
        }
    }

    #[tokio::test]
    async fn error_aborts_sweep_and_keeps_flushed_pages() {
        let source = Scripted::new(|code, page| match (code.map(ThemeCode::as_str), page) {
            (Some("2111"), 0) => Ok(tunes(0, 10)),
            (Some("2111"), _) => Err(throttled()),
            _ => Ok(tunes(page, 1)),
        });
        let temp = tempdir().unwrap();
        let codes = vec![code("2111"), code("2112")];

        let err = scrape_by_code(&source, temp.path(), codes, Paging::default())
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<ArchiveError>(), Some(ArchiveError::Status { .. })));
        assert_eq!(
            source.calls(),
            vec![(Some("2111".to_string()), 0), (Some("2111".to_string()), 1)]
        );
        let partial = store::read_tunes(&store::code_path(temp.path(), &code("2111"))).unwrap();
        assert_eq!(partial.len(), 10);
        assert!(!store::is_done(temp.path(), &code("2112")));
    }

    #[tokio::test]
    async fn custom_paging_is_respected() {
        let source = Scripted::new(|_, page| Ok(tunes(page, 5)));
        let temp = tempdir().unwrap();
        let paging = Paging {
            page_size: 5,
            max_pages_per_code: 3,
        };

        let run = scrape_code(&source, temp.path(), &code("7654"), paging).await.unwrap();
        assert_eq!(run.pages, 3);
        assert_eq!(run.kept, 15);
    }
}
