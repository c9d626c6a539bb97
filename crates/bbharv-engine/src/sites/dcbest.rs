//! dcinside "실시간 베스트" board.
//!
//! Direct-item listing: post ids are probed one by one with a cheap HTTP
//! metadata fetch, and only posts whose declared comment count clears a
//! fixed bar get the full render crawl. Comment pagination advances by
//! clicking the anchor following the current `em` marker.

use bbharv_core::{Comment, PostId, PostMeta};
use scraper::{ElementRef, Html};

use crate::admission::AdmissionPolicy;
use crate::dom;
use crate::error::EngineError;
use crate::sites::{click_page_link_script, ListingMode, PostHeader, Site};
use crate::walker::{Extracted, NextAction, NextProbe, PagedFlow};

const BASE: &str = "https://gall.dcinside.com";
const DEFAULT_THRESHOLD: u32 = 300;

pub struct DcBest {
    comments: DcCommentFlow,
}

impl DcBest {
    #[must_use]
    pub fn new() -> Self {
        Self {
            comments: DcCommentFlow,
        }
    }
}

impl Default for DcBest {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for DcBest {
    fn slug(&self) -> &'static str {
        "dcbest"
    }

    fn listing(&self) -> ListingMode {
        ListingMode::DirectItem
    }

    fn default_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::Fixed(DEFAULT_THRESHOLD)
    }

    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Referer", "https://gall.dcinside.com/")]
    }

    fn item_url(&self, id: PostId) -> String {
        format!("{BASE}/board/view/?id=dcbest&no={id}&_dcbest=6")
    }

    fn meta(&self, html: &str, id: PostId, final_url: &str) -> Option<PostMeta> {
        let doc = Html::parse_document(html);
        let head = doc.select(&dom::selector("div.gallview_head")).next()?;

        let nick = dom::el_first_text(head, &dom::selector("span.nickname"))?;
        let (author, author_ip) = dom::split_author(&nick);

        Some(PostMeta {
            id,
            url: final_url.to_string(),
            title: dom::el_first_text(head, &dom::selector(".title_subject"))?,
            author,
            author_ip,
            date: dom::el_first_text(head, &dom::selector(".gall_date"))?,
        })
    }

    fn detail_ready_selector(&self) -> &'static str {
        "div.gallview_head"
    }

    fn comment_count_hint(&self, doc: &Html) -> Option<u32> {
        dom::doc_first_text(doc, &dom::selector("span.gall_comment a"))
            .and_then(|t| dom::parse_count(&t))
    }

    fn post_header(&self, doc: &Html) -> Result<PostHeader, EngineError> {
        let missing = |what: &str| EngineError::Extract {
            context: "dcbest post".to_string(),
            reason: format!("{what} missing"),
        };

        let head = doc
            .select(&dom::selector("div.gallview_head"))
            .next()
            .ok_or_else(|| missing("gallview_head"))?;

        let nick = dom::el_first_text(head, &dom::selector(".nickname"))
            .ok_or_else(|| missing("nickname"))?;
        let (author, author_ip) = dom::split_author(&nick);

        Ok(PostHeader {
            title: dom::el_first_text(head, &dom::selector(".title_subject"))
                .ok_or_else(|| missing("title"))?,
            author,
            author_ip,
            date: dom::el_first_text(head, &dom::selector(".gall_date"))
                .ok_or_else(|| missing("date"))?,
            body_text: dom::doc_first_text(doc, &dom::selector("div.write_div"))
                .ok_or_else(|| missing("body"))?,
            body_images: Vec::new(),
            likes: dom::count_of(
                doc,
                &dom::selector("span.upcnt, #recommend_point, span.gall_recommend"),
            ),
            dislikes: dom::count_of(
                doc,
                &dom::selector("span.downcnt, #non_recommend_point, span.gall_non_recommend"),
            ),
        })
    }

    fn comment_flow(&self) -> &dyn PagedFlow<Comment> {
        &self.comments
    }
}

/// dcinside comment paging: the current page is the lone `em` in
/// `div.cmt_paging`; the next page is the anchor immediately following it.
struct DcCommentFlow;

impl DcCommentFlow {
    fn extract_one(li: ElementRef<'_>) -> Option<Comment> {
        let text = dom::el_first_text(li, &dom::selector("div.clear.cmt_txtbox p.usertxt"))
            .or_else(|| dom::el_first_text(li, &dom::selector("div.comment_dccon")))
            .filter(|t| !t.is_empty())?;

        let raw = dom::el_first_text(
            li,
            &dom::selector("div.cmt_nickbox span.nickname, span.nickname"),
        )?;
        let (author, author_ip) = dom::split_author(&raw);

        let date = dom::el_first_text(
            li,
            &dom::selector("span.date_time, span.gall_date, span.ut"),
        )?;

        Some(Comment {
            author,
            author_ip,
            date,
            text,
            likes: None,
            dislikes: None,
            keyword_hits: None,
        })
    }
}

impl PagedFlow<Comment> for DcCommentFlow {
    fn extract(&self, doc: &Html) -> Extracted<Comment> {
        let mut out = Extracted::default();
        for li in doc.select(&dom::selector("li.ub-content, li.ub-w")) {
            match Self::extract_one(li) {
                Some(comment) => out.items.push(comment),
                None => out.skipped += 1,
            }
        }
        out
    }

    fn marker(&self, doc: &Html) -> Option<String> {
        dom::doc_first_text(doc, &dom::selector("div.cmt_paging em"))
    }

    fn next(&self, doc: &Html) -> NextProbe {
        let Some(current) = doc.select(&dom::selector("div.cmt_paging em")).next() else {
            return NextProbe::End;
        };

        // First element sibling after the current-page marker.
        let following = current
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a");
        let Some(link) = following else {
            return NextProbe::End;
        };
        if link.value().classes().any(|c| c == "disabled") {
            return NextProbe::Disabled;
        }

        let label = dom::text_of(link);
        if label.is_empty() {
            return NextProbe::End;
        }
        let script = click_page_link_script("div.cmt_paging", &label);
        NextProbe::Next(NextAction { label, script })
    }
}
