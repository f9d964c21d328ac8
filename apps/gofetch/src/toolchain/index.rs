//! Release index fetching and parsing for gofetch.
//!
//! The release index is the HTML download page (`https://golang.org/dl/`).
//! Each release has a section whose `id` is the version tag, holding a table
//! with one row per distributable file:
//!
//! ```html
//! <div class="toggle" id="go1.21.0">
//!   <table class="downloadtable">
//!     <tr><th>File name</th>...<th>SHA256 Checksum</th></tr>
//!     <tr>
//!       <td class="filename"><a class="download" href="/dl/go1.21.0.linux-amd64.tar.gz">go1.21.0.linux-amd64.tar.gz</a></td>
//!       ...
//!       <td><tt>d0398903a16ba2232b389fb31032ddf57cac34efda306a0eebac34f0965a0742</tt></td>
//!     </tr>
//!   </table>
//! </div>
//! ```

use std::fmt;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};

use crate::config::Config;
use crate::errors::GofetchError;

/// Expected digest of a release file as published on the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    /// Hex-encoded SHA-256 digest.
    Sha256(String),
    /// The row had no checksum.
    Unknown,
}

impl Checksum {
    /// Builds a checksum from cell text; blank text is [`Checksum::Unknown`].
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Self::Unknown
        } else {
            Self::Sha256(text.to_string())
        }
    }

    /// The hex digest, if known.
    #[must_use]
    pub fn as_hex(&self) -> Option<&str> {
        match self {
            Self::Sha256(hex) => Some(hex),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256(hex) => f.write_str(hex),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Release files and their checksums for one version, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIndex {
    version: String,
    files: IndexMap<String, Checksum>,
}

impl ReleaseIndex {
    /// Builds an index from already-known entries.
    #[cfg(test)]
    pub fn from_entries(
        version: impl Into<String>,
        entries: impl IntoIterator<Item = (String, Checksum)>,
    ) -> Self {
        Self {
            version: version.into(),
            files: entries.into_iter().collect(),
        }
    }

    /// Extracts the section for `version` from the release page.
    ///
    /// Every table row holding at least one `td` is a distributable. A row
    /// without a checksum maps to [`Checksum::Unknown`]; a row without a file
    /// name is keyed `unknown-<row>`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if no element has `id == version`, the section
    /// has no distributable rows, or two rows name the same file.
    pub fn parse(html: &str, version: &str) -> Result<Self, GofetchError> {
        let document = Html::parse_document(html);
        let with_id = selector("[id]")?;
        let rows = selector("tr")?;
        let cells = selector("td")?;
        let filename_cell = selector("td.filename")?;
        let link = selector("a[href]")?;
        let digest = selector("tt, code")?;

        let section = document
            .select(&with_id)
            .find(|el| el.value().attr("id") == Some(version))
            .ok_or_else(|| {
                GofetchError::parse(format!("release index has no section for {version}"))
            })?;

        let mut files = IndexMap::new();
        for (row_number, row) in section
            .select(&rows)
            .filter(|row| row.select(&cells).next().is_some())
            .enumerate()
        {
            let name = row
                .select(&filename_cell)
                .next()
                .and_then(|cell| file_name(cell, &link))
                .unwrap_or_else(|| format!("unknown-{}", row_number + 1));
            let checksum = row
                .select(&digest)
                .next()
                .map_or(Checksum::Unknown, |el| Checksum::from_text(&text_of(el)));
            if files.contains_key(&name) {
                return Err(GofetchError::parse(format!(
                    "release index section {version} lists {name} more than once"
                )));
            }
            files.insert(name, checksum);
        }

        if files.is_empty() {
            return Err(GofetchError::parse(format!(
                "release index section {version} has no file rows"
            )));
        }

        tracing::debug!(version, files = files.len(), "parsed release index");
        Ok(Self {
            version: version.to_string(),
            files,
        })
    }

    /// The version this index was built for.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Checksum of a file, if it is listed.
    #[cfg(test)]
    pub fn get(&self, file: &str) -> Option<&Checksum> {
        self.files.get(file)
    }

    /// Files and checksums in page order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Checksum)> {
        self.files.iter().map(|(name, sum)| (name.as_str(), sum))
    }
}

/// Downloads the release page and extracts the section for `version`.
///
/// # Errors
///
/// Returns a network error if the page cannot be fetched and a parse error
/// if its layout does not contain the version.
pub async fn fetch_release_index(
    client: &reqwest::Client,
    config: &Config,
    version: &str,
) -> Result<ReleaseIndex, GofetchError> {
    let url = config.index_url.as_str();
    tracing::info!(url, version, "fetching release index");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GofetchError::network_with_source(format!("failed to fetch {url}"), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GofetchError::network(format!("HTTP {status} from {url}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| GofetchError::network_with_source(format!("failed to read {url}"), e))?;

    ReleaseIndex::parse(&body, version)
}

fn selector(css: &str) -> Result<Selector, GofetchError> {
    Selector::parse(css).map_err(|e| GofetchError::parse(format!("invalid selector {css}: {e:?}")))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// File name from the link's last path segment, else from the cell text.
fn file_name(cell: ElementRef<'_>, link: &Selector) -> Option<String> {
    let from_href = cell
        .select(link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.split(['?', '#']).next().unwrap_or(href))
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    from_href.or_else(|| {
        let text = text_of(cell);
        (!text.is_empty()).then_some(text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<div class="toggleVisible" id="go1.21.0">
  <div class="expanded">
    <table class="downloadtable">
      <thead>
        <tr><th>File name</th><th>Kind</th><th>OS</th><th>Arch</th><th>Size</th><th>SHA256 Checksum</th></tr>
      </thead>
      <tr class="highlight">
        <td class="filename"><a class="download" href="/dl/go1.21.0.src.tar.gz">go1.21.0.src.tar.gz</a></td>
        <td>Source</td><td></td><td></td><td>26MB</td>
        <td><tt>818d46ede85682dd551ad378ef37a4d247006f12ec59b5af91e2fa1dcd72d29</tt></td>
      </tr>
      <tr class="highlight">
        <td class="filename"><a class="download" href="/dl/go1.21.0.linux-amd64.tar.gz">go1.21.0.linux-amd64.tar.gz</a></td>
        <td>Archive</td><td>Linux</td><td>x86-64</td><td>64MB</td>
        <td><tt>d0398903a16ba2232b389fb31032ddf57cac34efda306a0eebac34f0965a0742</tt></td>
      </tr>
      <tr>
        <td class="filename"><a class="download" href="/dl/go1.21.0.windows-amd64.msi">go1.21.0.windows-amd64.msi</a></td>
        <td>Installer</td><td>Windows</td><td>x86-64</td><td>62MB</td>
        <td></td>
      </tr>
      <tr>
        <td class="filename"></td>
        <td>Archive</td><td>Plan 9</td><td>x86-64</td><td>60MB</td>
        <td><tt>ffff</tt></td>
      </tr>
    </table>
  </div>
</div>
<div class="toggle" id="go1.20.7">
  <table class="downloadtable">
    <tr>
      <td class="filename"><a class="download" href="https://dl.google.com/go/go1.20.7.linux-amd64.tar.gz?x=1">go1.20.7.linux-amd64.tar.gz</a></td>
      <td><tt>f0a87f1bcae91c4b69f8dc2bc6d7e6bfcd7524fceec130af525058c0c17b1b44</tt></td>
    </tr>
  </table>
</div>
</body></html>
"#;

    #[test]
    fn one_entry_per_distributable_row() {
        let index = ReleaseIndex::parse(PAGE, "go1.21.0").unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.version(), "go1.21.0");
        let names: Vec<&str> = index.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "go1.21.0.src.tar.gz",
                "go1.21.0.linux-amd64.tar.gz",
                "go1.21.0.windows-amd64.msi",
                "unknown-4",
            ]
        );
    }

    #[test]
    fn checksums_come_from_tt_elements() {
        let index = ReleaseIndex::parse(PAGE, "go1.21.0").unwrap();
        assert_eq!(
            index.get("go1.21.0.linux-amd64.tar.gz").and_then(Checksum::as_hex),
            Some("d0398903a16ba2232b389fb31032ddf57cac34efda306a0eebac34f0965a0742")
        );
    }

    #[test]
    fn missing_checksum_is_explicit_unknown() {
        let index = ReleaseIndex::parse(PAGE, "go1.21.0").unwrap();
        assert_eq!(
            index.get("go1.21.0.windows-amd64.msi"),
            Some(&Checksum::Unknown)
        );
        assert_eq!(Checksum::Unknown.to_string(), "unknown");
    }

    #[test]
    fn absolute_links_and_query_strings_are_reduced_to_file_names() {
        let index = ReleaseIndex::parse(PAGE, "go1.20.7").unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get("go1.20.7.linux-amd64.tar.gz").is_some());
    }

    #[test]
    fn sections_are_scoped_to_their_version() {
        let index = ReleaseIndex::parse(PAGE, "go1.20.7").unwrap();
        assert!(index.get("go1.21.0.linux-amd64.tar.gz").is_none());
    }

    #[test]
    fn missing_section_is_parse_error() {
        let err = ReleaseIndex::parse(PAGE, "go1.99.0").unwrap_err();
        assert!(matches!(err, GofetchError::Parse { .. }));
    }

    #[test]
    fn section_without_rows_is_parse_error() {
        let html = r#"<div id="go1.21.0"><p>moved</p></div>"#;
        let err = ReleaseIndex::parse(html, "go1.21.0").unwrap_err();
        assert!(matches!(err, GofetchError::Parse { .. }));
    }

    #[test]
    fn duplicate_file_rows_are_parse_error() {
        let html = r#"<div id="go1.21.0"><table>
            <tr><td class="filename"><a href="/dl/go1.21.0.linux-amd64.tar.gz">x</a></td><td><tt>aaaa</tt></td></tr>
            <tr><td class="filename"><a href="/dl/go1.21.0.linux-amd64.tar.gz">x</a></td><td><tt>bbbb</tt></td></tr>
        </table></div>"#;
        let err = ReleaseIndex::parse(html, "go1.21.0").unwrap_err();
        assert!(matches!(err, GofetchError::Parse { .. }));
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn link_text_is_used_when_href_is_empty() {
        let html = r#"<div id="go1.21.0"><table><tr>
            <td class="filename">go1.21.0.linux-arm64.tar.gz</td>
            <td><code>abcd</code></td>
        </tr></table></div>"#;
        let index = ReleaseIndex::parse(html, "go1.21.0").unwrap();
        assert_eq!(
            index.get("go1.21.0.linux-arm64.tar.gz"),
            Some(&Checksum::Sha256("abcd".to_string()))
        );
    }
}
