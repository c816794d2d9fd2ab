//! Streaming page extraction
//!
//! A single pass over the HTML token stream that does two jobs at once:
//! pushes every discovered link to the discovery queue (deduplicated against
//! the seen set, dropped when the queue is full) and accumulates visible
//! text up to a soft word budget. Link discovery covers the whole document;
//! text capture stops once the budget is crossed and never includes
//! `<script>`/`<style>` content.

use crate::state::UrlSeen;
use crate::stats::SessionStats;
use crate::CrawlError;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared handles the extractor needs from the session
pub struct ExtractorContext<'a> {
    pub discovery: &'a mpsc::Sender<String>,
    pub seen: &'a UrlSeen,
    pub stats: &'a SessionStats,
    pub cancel: &'a CancellationToken,
    pub word_budget: usize,
}

/// Token sink driving link discovery and text capture
struct Extractor<'a> {
    ctx: &'a ExtractorContext<'a>,
    base: &'a Url,
    /// Nesting count of currently-open script/style containers. Mismatched
    /// end tags may take it negative; only the positive case suppresses text.
    depth: i32,
    text_on: bool,
    words_so_far: usize,
    /// Character tokens of the current text run, coalesced until the next
    /// tag so the trim/guard logic sees whole runs
    pending: String,
    text: String,
    halted: bool,
    bad_href: Option<String>,
}

impl<'a> Extractor<'a> {
    fn new(ctx: &'a ExtractorContext<'a>, base: &'a Url) -> Self {
        Self {
            ctx,
            base,
            depth: 0,
            text_on: true,
            words_so_far: 0,
            pending: String::new(),
            text: String::new(),
            halted: false,
            bad_href: None,
        }
    }

    fn handle_anchor(&mut self, tag: &Tag) {
        for attr in &tag.attrs {
            if attr.name.local.as_ref() != "href" {
                continue;
            }

            if self.ctx.cancel.is_cancelled() {
                self.halted = true;
                return;
            }

            let resolved = match self.base.join(&attr.value) {
                Ok(url) => url,
                Err(err) => {
                    self.bad_href = Some(format!("bad href {}: {}", &*attr.value, err));
                    self.halted = true;
                    return;
                }
            };

            self.ctx.stats.inc_urls_discovered();

            if !self.ctx.seen.insert(resolved.as_str()) {
                self.ctx.stats.inc_urls_skipped();
                self.ctx.stats.inc_skipped_cached();
                tracing::debug!(url = %resolved, "link already seen");
                continue;
            }

            match self.ctx.discovery.try_send(resolved.to_string()) {
                Ok(()) => {
                    tracing::debug!(url = %resolved, "queued discovered link");
                }
                Err(mpsc::error::TrySendError::Full(url)) => {
                    // Bounded memory beats completeness: the link is dropped
                    tracing::debug!(%url, "discovery queue full, dropping link");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.halted = true;
                    return;
                }
            }
        }
    }

    /// Accumulates a character token into the current run
    fn buffer_text(&mut self, text: &str) {
        if !self.text_on || self.depth > 0 {
            return;
        }
        self.pending.push_str(text);
    }

    /// Closes the current text run: trim, guard, append, count
    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let run = std::mem::take(&mut self.pending);
        let trimmed = run.trim();
        if !trimmed.is_empty() && !trimmed.contains("<iframe") {
            self.text.push_str(trimmed);
            self.text.push(' ');
        }
        self.words_so_far += trimmed.split_whitespace().count();
        if self.words_so_far > self.ctx.word_budget {
            self.text_on = false;
        }
    }
}

impl TokenSink for Extractor<'_> {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if self.halted {
            return TokenSinkResult::Continue;
        }

        match token {
            Token::CharacterTokens(text) => self.buffer_text(&text),
            Token::NullCharacterToken => {}
            Token::TagToken(tag) => {
                self.flush_text();
                match tag.kind {
                    TagKind::StartTag => match tag.name.as_ref() {
                        "a" => self.handle_anchor(&tag),
                        "script" => {
                            self.depth += 1;
                            return TokenSinkResult::RawData(RawKind::ScriptData);
                        }
                        "style" => {
                            self.depth += 1;
                            return TokenSinkResult::RawData(RawKind::Rawtext);
                        }
                        _ => {}
                    },
                    TagKind::EndTag => {
                        if matches!(tag.name.as_ref(), "script" | "style") {
                            self.depth -= 1;
                        }
                    }
                }
            }
            // Recoverable parse errors are not run boundaries
            Token::ParseError(_) => {}
            Token::EOFToken => self.flush_text(),
            _ => self.flush_text(),
        }

        TokenSinkResult::Continue
    }
}

/// Runs one extraction pass over a fetched page body
///
/// Returns the bounded text buffer for the page record, or an error when a
/// href fails to resolve (the page is abandoned, as is the remaining
/// stream) or the session was cancelled mid-extraction.
pub fn extract_page(
    body: &str,
    base: &Url,
    ctx: &ExtractorContext<'_>,
) -> Result<String, CrawlError> {
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(body));

    let mut tokenizer = Tokenizer::new(Extractor::new(ctx, base), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    let extractor = tokenizer.sink;
    if let Some(message) = extractor.bad_href {
        return Err(CrawlError::Parse {
            url: base.to_string(),
            message,
        });
    }
    if extractor.halted {
        return Err(CrawlError::Cancelled);
    }

    Ok(extractor.text)
}
