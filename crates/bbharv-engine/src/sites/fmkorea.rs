//! FM Korea "포텐 터짐" best board.
//!
//! List-page listing: each index page carries the candidate summaries, and
//! the mean-of-page policy picks which posts are crawled. Comment paging is
//! numbered links in `div.bd_pg`, confirmed by the `strong.this` marker.

use bbharv_core::{Comment, PostId, PostSummary};
use scraper::{ElementRef, Html};

use crate::admission::AdmissionPolicy;
use crate::dom;
use crate::error::EngineError;
use crate::sites::{click_page_link_script, ListingMode, PostHeader, Site};
use crate::walker::{Extracted, NextAction, NextProbe, PagedFlow};

const BASE: &str = "https://www.fmkorea.com";

pub struct FmKorea {
    comments: FmCommentFlow,
}

impl FmKorea {
    #[must_use]
    pub fn new() -> Self {
        Self {
            comments: FmCommentFlow,
        }
    }

    fn summary_from_item(li: ElementRef<'_>) -> Option<PostSummary> {
        let href = dom::el_first_attr(li, &dom::selector("a.pc_voted_count"), "href")?;
        let id: PostId = href.rsplit('/').next()?.parse().ok()?;
        let count = dom::el_first_text(li, &dom::selector("span.comment_count"))
            .and_then(|t| dom::parse_count(&t))?;
        Some(PostSummary {
            id,
            url: format!("{BASE}/best/{id}"),
            comment_count: count,
        })
    }
}

impl Default for FmKorea {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for FmKorea {
    fn slug(&self) -> &'static str {
        "fmkorea"
    }

    fn listing(&self) -> ListingMode {
        ListingMode::ListPage
    }

    fn default_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::MeanOfPage
    }

    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Referer", "https://www.fmkorea.com/")]
    }

    fn list_url(&self, page: u64) -> Option<String> {
        Some(format!("{BASE}/index.php?mid=best&page={page}"))
    }

    fn item_url(&self, id: PostId) -> String {
        format!("{BASE}/best/{id}")
    }

    fn list_summaries(&self, doc: &Html) -> Extracted<PostSummary> {
        let mut out = Extracted::default();
        for li in doc.select(&dom::selector("li.li_best2_pop0")) {
            match Self::summary_from_item(li) {
                Some(summary) => out.items.push(summary),
                None => out.skipped += 1,
            }
        }
        out
    }

    fn detail_ready_selector(&self) -> &'static str {
        "div.rd_hd"
    }

    fn post_header(&self, doc: &Html) -> Result<PostHeader, EngineError> {
        let missing = |what: &str| EngineError::Extract {
            context: "fmkorea post".to_string(),
            reason: format!("{what} missing"),
        };

        let head = doc
            .select(&dom::selector("div.rd_hd"))
            .next()
            .ok_or_else(|| missing("rd_hd"))?;

        let plate = dom::el_first_text(head, &dom::selector("a.member_plate"))
            .ok_or_else(|| missing("member_plate"))?;
        let (author, author_ip) = dom::split_author(&plate);

        Ok(PostHeader {
            title: dom::el_first_text(head, &dom::selector("h1.np_18px span"))
                .ok_or_else(|| missing("title"))?,
            author,
            author_ip,
            date: dom::el_first_text(head, &dom::selector("span.date"))
                .ok_or_else(|| missing("date"))?,
            body_text: dom::doc_first_text(doc, &dom::selector("article .xe_content"))
                .ok_or_else(|| missing("body"))?,
            body_images: Vec::new(),
            likes: dom::count_of(doc, &dom::selector("span.btn_img.new_voted_count")),
            dislikes: dom::count_of(doc, &dom::selector("a.vote3")),
        })
    }

    fn comment_flow(&self) -> &dyn PagedFlow<Comment> {
        &self.comments
    }
}

/// FM Korea comment paging: numbered anchors in `div.bd_pg`; the loaded page
/// is marked with `strong.this`.
struct FmCommentFlow;

impl FmCommentFlow {
    fn extract_one(li: ElementRef<'_>) -> Option<Comment> {
        let author =
            dom::el_first_text(li, &dom::selector("div.meta a.member_plate"))?;
        let date = dom::el_first_text(li, &dom::selector("div.meta span.date"))?;
        let text =
            dom::el_first_text(li, &dom::selector("div.comment-content .xe_content"))?;

        Some(Comment {
            author,
            author_ip: None,
            date,
            text,
            likes: None,
            dislikes: None,
            keyword_hits: None,
        })
    }
}

impl PagedFlow<Comment> for FmCommentFlow {
    fn extract(&self, doc: &Html) -> Extracted<Comment> {
        let mut out = Extracted::default();
        for li in doc.select(&dom::selector("ul.fdb_lst_ul li.fdb_itm")) {
            match Self::extract_one(li) {
                Some(comment) => out.items.push(comment),
                None => out.skipped += 1,
            }
        }
        out
    }

    fn marker(&self, doc: &Html) -> Option<String> {
        dom::doc_first_text(doc, &dom::selector("div.bd_pg strong.this"))
    }

    fn next(&self, doc: &Html) -> NextProbe {
        let Some(current) = self
            .marker(doc)
            .and_then(|m| dom::parse_count(&m))
        else {
            return NextProbe::End;
        };
        let label = (current + 1).to_string();

        let link = doc
            .select(&dom::selector("div.bd_pg a"))
            .find(|a| dom::text_of(*a) == label);
        let Some(link) = link else {
            return NextProbe::End;
        };
        if link.value().classes().any(|c| c == "disabled") {
            return NextProbe::Disabled;
        }

        let script = click_page_link_script("div.bd_pg", &label);
        NextProbe::Next(NextAction { label, script })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAGE: &str = r#"
      <ul>
        <li class="li_best2_pop0">
          <a class="pc_voted_count" href="/best/1001">추천</a>
          <span class="comment_count">[120]</span>
        </li>
        <li class="li_best2_pop0">
          <a class="pc_voted_count" href="/best/1002">추천</a>
          <span class="comment_count">[45]</span>
        </li>
        <li class="li_best2_pop0">
          <span class="comment_count">[9]</span>
        </li>
      </ul>
    "#;

    #[test]
    fn list_summaries_extracts_ids_and_counts() {
        let site = FmKorea::new();
        let doc = Html::parse_document(LIST_PAGE);
        let out = site.list_summaries(&doc);
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.items[0].id, 1001);
        assert_eq!(out.items[0].comment_count, 120);
        assert_eq!(out.items[0].url, "https://www.fmkorea.com/best/1001");
        assert_eq!(out.items[1].id, 1002);
    }

    const DETAIL: &str = r#"
      <div class="rd_hd">
        <h1 class="np_18px"><span>포텐 제목</span></h1>
        <a class="member_plate">베스트유저</a>
        <span class="date">2025.05.26 09:00</span>
      </div>
      <article><div class="xe_content">본문이 여기 있습니다.</div></article>
      <span class="btn_img new_voted_count">512</span>
      <a class="vote3">3</a>
    "#;

    #[test]
    fn post_header_reads_detail_fields() {
        let site = FmKorea::new();
        let doc = Html::parse_document(DETAIL);
        let header = site.post_header(&doc).unwrap();
        assert_eq!(header.title, "포텐 제목");
        assert_eq!(header.author, "베스트유저");
        assert!(header.author_ip.is_none());
        assert_eq!(header.likes, 512);
        assert_eq!(header.dislikes, 3);
    }

    const COMMENT_PAGE: &str = r#"
      <ul class="fdb_lst_ul">
        <li class="fdb_itm">
          <div class="meta"><a class="member_plate">댓글러1</a><span class="date">1시간 전</span></div>
          <div class="comment-content"><div class="xe_content">동의합니다</div></div>
        </li>
        <li class="fdb_itm">
          <div class="meta"><a class="member_plate">댓글러2</a><span class="date">방금</span></div>
          <div class="comment-content"><div class="xe_content">반대합니다</div></div>
        </li>
      </ul>
      <div class="bd_pg"><strong class="this">1</strong><a>2</a><a>3</a></div>
    "#;

    #[test]
    fn comment_flow_extracts_in_dom_order() {
        let flow = FmCommentFlow;
        let doc = Html::parse_document(COMMENT_PAGE);
        let out = flow.extract(&doc);
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].text, "동의합니다");
        assert_eq!(out.items[1].text, "반대합니다");
    }

    #[test]
    fn next_advances_to_the_numerically_following_page() {
        let flow = FmCommentFlow;
        let doc = Html::parse_document(COMMENT_PAGE);
        assert_eq!(flow.marker(&doc).as_deref(), Some("1"));
        let NextProbe::Next(action) = flow.next(&doc) else {
            panic!("expected a next action");
        };
        assert_eq!(action.label, "2");
        assert!(action.script.contains("div.bd_pg"));
    }

    #[test]
    fn next_ends_when_no_higher_page_is_linked() {
        let flow = FmCommentFlow;
        let doc = Html::parse_document(
            r#"<div class="bd_pg"><a>1</a><a>2</a><strong class="this">3</strong></div>"#,
        );
        assert_eq!(flow.next(&doc), NextProbe::End);
    }

    #[test]
    fn next_ends_without_a_pager() {
        let flow = FmCommentFlow;
        let doc = Html::parse_document("<p>댓글 페이지 네비 없음</p>");
        assert_eq!(flow.next(&doc), NextProbe::End);
    }
}
