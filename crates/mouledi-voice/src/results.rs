//! The results screen: loading the provider list once a session has been
//! dispatched, and acting on what is said while it is shown.

use std::sync::Arc;

use mouledi_nlu::{parse_command, QueryRouter, ResultsCommand};
use mouledi_types::{
    Coordinates, District, Intent, PromptKey, ProviderKind, ProviderQuery, ProviderRecord,
};
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::feedback::FeedbackPlayer;
use crate::services::ProviderSearch;

/// One screenful of providers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPage {
    pub intent: Intent,
    pub district: Option<District>,
    pub items: Vec<ProviderRecord>,
    /// On-call search came back empty and all pharmacies were listed instead.
    pub widened: bool,
}

impl ResultsPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `tel:` URI for the item at `index`, when it has a phone number.
    pub fn dial_uri(&self, index: usize) -> Option<String> {
        let phone = self.items.get(index)?.phone.as_deref()?;
        let digits: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() {
            return None;
        }
        Some(format!("tel:{digits}"))
    }

    /// `tel:` URI targeted by a spoken "call n" command.
    pub fn dial_uri_for(&self, command: ResultsCommand) -> Option<String> {
        command.call_index().and_then(|index| self.dial_uri(index))
    }
}

/// What a transcript spoken on the results screen asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsAction {
    /// Leave the results screen.
    Back,
    /// "Call n": the `tel:` URI of item n, or `None` when it has no number.
    Call(Option<String>),
    /// Too short to act on; the repeat prompt was played.
    Repeat,
    /// The transcript was a new query and replaced the page.
    Page(ResultsPage),
}

/// Transcripts with fewer trimmed characters are treated as noise.
const MIN_TRANSCRIPT_CHARS: usize = 2;

/// Runs provider searches with the results-screen fallback rules.
pub struct ResultsLoader {
    search: Arc<dyn ProviderSearch>,
    feedback: Arc<FeedbackPlayer>,
    router: QueryRouter,
    limit: u32,
}

impl ResultsLoader {
    pub fn new(search: Arc<dyn ProviderSearch>, feedback: Arc<FeedbackPlayer>, limit: u32) -> Self {
        Self {
            search,
            feedback,
            router: QueryRouter::default(),
            limit,
        }
    }

    /// Replaces the built-in rule tables used for follow-up queries.
    pub fn with_router(mut self, router: QueryRouter) -> Self {
        self.router = router;
        self
    }

    pub async fn load(
        &self,
        intent: Intent,
        district: Option<District>,
        near: Option<Coordinates>,
    ) -> Result<ResultsPage, ServiceError> {
        // Unknown intents list every pharmacy, whatever district was heard.
        let (kind, district) = match intent.provider_kind() {
            Some(kind) => (kind, district),
            None => (ProviderKind::Pharmacy, None),
        };
        let query = ProviderQuery::new(kind)
            .with_district(district)
            .near(near)
            .limit(self.limit);

        let mut widened = false;
        let items = if intent == Intent::PharmacyOnCall {
            let on_call = self.search.search(&query.clone().on_call(true)).await?;
            if on_call.is_empty() {
                info!(district = ?district, "no pharmacy on call, listing all pharmacies");
                widened = true;
                self.search.search(&query).await?
            } else {
                on_call
            }
        } else {
            self.search.search(&query).await?
        };

        let page = ResultsPage {
            intent,
            district,
            items,
            widened,
        };
        info!(intent = %intent, count = page.items.len(), widened, "results loaded");

        if page.is_empty() {
            if intent == Intent::Clinic {
                info!(district = ?district, "no clinic found");
                self.feedback.play(PromptKey::FallbackPharmaciesOrRetry).await;
            }
        } else {
            self.feedback.play(PromptKey::TapItemToListen).await;
        }
        Ok(page)
    }

    /// Acts on a transcript heard while `page` is on screen.
    ///
    /// Voice commands are checked before the text is routed as a new query.
    /// A query that matches no intent plays the fallback prompt and lists
    /// every pharmacy.
    pub async fn handle_transcript(
        &self,
        page: &ResultsPage,
        text: &str,
        near: Option<Coordinates>,
    ) -> Result<ResultsAction, ServiceError> {
        if let Some(command) = parse_command(text) {
            debug!(?command, "results command");
            return Ok(match command {
                ResultsCommand::Back => ResultsAction::Back,
                ResultsCommand::Call(_) => ResultsAction::Call(page.dial_uri_for(command)),
            });
        }

        let text = text.trim();
        if text.chars().count() < MIN_TRANSCRIPT_CHARS {
            self.feedback.play(PromptKey::RepeatPlease).await;
            return Ok(ResultsAction::Repeat);
        }

        let routing = self.router.route(text);
        info!(intent = %routing.intent, district = ?routing.district, "follow-up query");
        if !routing.intent.is_dispatchable() {
            self.feedback.play(PromptKey::FallbackPharmaciesOrRetry).await;
        }
        let page = self.load(routing.intent, routing.district, near).await?;
        Ok(ResultsAction::Page(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, phone: Option<&str>) -> ProviderRecord {
        ProviderRecord {
            provider_id: None,
            kind: Some("pharmacy".to_string()),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            address: None,
            district: None,
            city: None,
            is_on_call_now: false,
            distance_km: None,
        }
    }

    fn page(items: Vec<ProviderRecord>) -> ResultsPage {
        ResultsPage {
            intent: Intent::Pharmacy,
            district: None,
            items,
            widened: false,
        }
    }

    #[test]
    fn dial_uri_strips_whitespace() {
        let page = page(vec![
            record("Pharmacie du Golfe", Some("+228 22 21 00 00")),
            record("Pharmacie Bè", None),
            record("Pharmacie vide", Some("  ")),
        ]);
        assert_eq!(page.dial_uri(0).as_deref(), Some("tel:+22822210000"));
        assert_eq!(page.dial_uri(1), None);
        assert_eq!(page.dial_uri(2), None);
        assert_eq!(page.dial_uri(3), None);
    }

    #[test]
    fn spoken_call_is_one_based() {
        let page = page(vec![
            record("A", Some("111")),
            record("B", Some("222")),
        ]);
        assert_eq!(page.dial_uri_for(ResultsCommand::Call(2)).as_deref(), Some("tel:222"));
        assert_eq!(page.dial_uri_for(ResultsCommand::Call(0)), None);
        assert_eq!(page.dial_uri_for(ResultsCommand::Call(3)), None);
        assert_eq!(page.dial_uri_for(ResultsCommand::Back), None);
    }
}
