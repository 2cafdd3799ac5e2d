//! Recognising pasted URLs that should become embeds.

use url::Url;

/// A URL accepted by an [`EmbedMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedMatch {
	pub href: String,
	pub provider: Option<String>,
}

/// Decides which URLs turn into embed nodes.
pub trait EmbedMatcher: Send + Sync {
	fn match_url(&self, url: &Url) -> Option<EmbedMatch>;
}

/// Matches URLs whose host is one of a configured list, or a subdomain of one.
///
/// The provider name is the first label of the configured host
/// (`youtube.com` reports `youtube`).
#[derive(Debug, Clone, Default)]
pub struct HostEmbedMatcher {
	hosts: Vec<String>,
}

impl HostEmbedMatcher {
	pub fn new(hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			hosts: hosts
				.into_iter()
				.map(|host| host.into().trim().trim_start_matches("www.").to_ascii_lowercase())
				.filter(|host| !host.is_empty())
				.collect(),
		}
	}

	pub fn hosts(&self) -> &[String] {
		&self.hosts
	}
}

impl EmbedMatcher for HostEmbedMatcher {
	fn match_url(&self, url: &Url) -> Option<EmbedMatch> {
		let host = url.host_str()?.to_ascii_lowercase();
		let configured = self.hosts.iter().find(|configured| {
			host == **configured
				|| host
					.strip_suffix(configured.as_str())
					.is_some_and(|prefix| prefix.ends_with('.'))
		})?;
		Some(EmbedMatch {
			href: url.to_string(),
			provider: configured.split('.').next().map(str::to_string),
		})
	}
}

/// Parses `text` as a single bare http(s) URL.
pub fn bare_url(text: &str) -> Option<Url> {
	let text = text.trim();
	if text.is_empty() || text.contains(char::is_whitespace) {
		return None;
	}
	let url = Url::parse(text).ok()?;
	matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn bare_url_accepts_only_single_web_urls() {
		assert!(bare_url("  https://example.com/a  ").is_some());
		assert!(bare_url("https://example.com and more").is_none());
		assert!(bare_url("ftp://example.com").is_none());
		assert!(bare_url("not a url").is_none());
	}

	#[test]
	fn host_matching_covers_subdomains() {
		let matcher = HostEmbedMatcher::new(["youtube.com", "www.vimeo.com"]);
		let hit = matcher
			.match_url(&Url::parse("https://m.youtube.com/watch?v=1").unwrap())
			.unwrap();
		assert_eq!(hit.provider.as_deref(), Some("youtube"));
		assert_eq!(hit.href, "https://m.youtube.com/watch?v=1");

		assert!(matcher.match_url(&Url::parse("https://vimeo.com/42").unwrap()).is_some());
		assert!(matcher.match_url(&Url::parse("https://notyoutube.com/x").unwrap()).is_none());
		assert!(matcher.match_url(&Url::parse("https://example.com").unwrap()).is_none());
	}
}
