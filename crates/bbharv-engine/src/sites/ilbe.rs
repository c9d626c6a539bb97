//! ilbe general board.
//!
//! List-page listing with the mean-of-page policy. Comments are loaded by
//! calling the page's own `loadComment(n)` function rather than clicking a
//! link; the paginate strip still carries the confirmation marker. Post
//! bodies keep their image URLs, and comments carry their own vote counts.

use bbharv_core::{Comment, PostId, PostSummary};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;

use crate::admission::AdmissionPolicy;
use crate::dom;
use crate::error::EngineError;
use crate::sites::{ListingMode, PostHeader, Site};
use crate::walker::{Extracted, NextAction, NextProbe, PagedFlow};

const BASE: &str = "https://www.ilbe.com";

fn view_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/view/(\d+)").expect("valid view-id regex"))
}

pub struct Ilbe {
    comments: IlbeCommentFlow,
}

impl Ilbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            comments: IlbeCommentFlow,
        }
    }

    fn summary_from_item(li: ElementRef<'_>) -> Option<PostSummary> {
        let count = dom::el_first_text(li, &dom::selector("span.comment a"))
            .and_then(|t| t.trim().parse::<u32>().ok())?;
        let href = dom::el_first_attr(li, &dom::selector("span.title a.subject"), "href")?;
        let id: PostId = view_id_re().captures(&href)?.get(1)?.as_str().parse().ok()?;
        Some(PostSummary {
            id,
            url: format!("{BASE}/view/{id}"),
            comment_count: count,
        })
    }
}

impl Default for Ilbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for Ilbe {
    fn slug(&self) -> &'static str {
        "ilbe"
    }

    fn listing(&self) -> ListingMode {
        ListingMode::ListPage
    }

    fn default_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::MeanOfPage
    }

    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Referer", "https://www.ilbe.com/")]
    }

    fn list_url(&self, page: u64) -> Option<String> {
        Some(format!("{BASE}/list/ilbe?page={page}&listStyle=list"))
    }

    fn item_url(&self, id: PostId) -> String {
        format!("{BASE}/view/{id}")
    }

    fn list_summaries(&self, doc: &Html) -> Extracted<PostSummary> {
        let mut out = Extracted::default();
        for li in doc.select(&dom::selector("ul.board-body > li")) {
            let classes: Vec<&str> = li.value().classes().collect();
            // Pinned notices and ad rows are not posts.
            if classes.contains(&"notice-line") || classes.contains(&"ad-line") {
                continue;
            }
            match Self::summary_from_item(li) {
                Some(summary) => out.items.push(summary),
                None => out.skipped += 1,
            }
        }
        out
    }

    fn detail_ready_selector(&self) -> &'static str {
        "div.post-content"
    }

    fn post_header(&self, doc: &Html) -> Result<PostHeader, EngineError> {
        let missing = |what: &str| EngineError::Extract {
            context: "ilbe post".to_string(),
            reason: format!("{what} missing"),
        };

        let title = doc
            .select(&dom::selector(r#"meta[property="og:title"]"#))
            .next()
            .and_then(|m| m.value().attr("content"))
            .map(str::to_string)
            .or_else(|| dom::doc_first_text(doc, &dom::selector("title")))
            .ok_or_else(|| missing("title"))?;

        let nick = dom::doc_first_text(doc, &dom::selector("span.nick"))
            .ok_or_else(|| missing("nick"))?;
        let (author, author_ip) = dom::split_author(&nick);

        let content = doc
            .select(&dom::selector("div.post-content"))
            .next()
            .ok_or_else(|| missing("post-content"))?;

        let body_text = content
            .select(&dom::selector("p"))
            .map(dom::text_of)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let body_images = content
            .select(&dom::selector("img"))
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect();

        Ok(PostHeader {
            title,
            author,
            author_ip,
            date: dom::doc_first_text(doc, &dom::selector("span.date"))
                .ok_or_else(|| missing("date"))?,
            body_text,
            body_images,
            likes: dom::count_of(doc, &dom::selector("span.recomm-vote > em, span.recomm")),
            dislikes: dom::count_of(
                doc,
                &dom::selector("span.recomm-vote.bad > em, span.non-recomm"),
            ),
        })
    }

    fn comment_flow(&self) -> &dyn PagedFlow<Comment> {
        &self.comments
    }
}

/// ilbe comment paging: script-driven. `loadComment(n)` swaps the comment
/// block in place and the paginate strip's `em` reflects the loaded page.
struct IlbeCommentFlow;

impl IlbeCommentFlow {
    fn extract_one(item: ElementRef<'_>) -> Option<Comment> {
        let author = dom::el_first_text(item, &dom::selector("span.global-nick.nick a"))?;
        let date = dom::el_first_text(item, &dom::selector("span.date-line"))?;
        let text = dom::el_first_text(item, &dom::selector("span.cmt"))?;

        let likes = dom::el_first_text(item, &dom::selector(r#"em[id^="cnt_good_"]"#))
            .and_then(|t| dom::parse_count(&t));
        let dislikes = dom::el_first_text(item, &dom::selector(r#"em[id^="cnt_bad_"]"#))
            .and_then(|t| dom::parse_count(&t));

        Some(Comment {
            author,
            author_ip: None,
            date,
            text,
            likes,
            dislikes,
            keyword_hits: None,
        })
    }
}

impl PagedFlow<Comment> for IlbeCommentFlow {
    fn extract(&self, doc: &Html) -> Extracted<Comment> {
        let mut out = Extracted::default();
        for item in doc.select(&dom::selector("div.comment-item")) {
            match Self::extract_one(item) {
                Some(comment) => out.items.push(comment),
                None => out.skipped += 1,
            }
        }
        out
    }

    fn marker(&self, doc: &Html) -> Option<String> {
        dom::doc_first_text(doc, &dom::selector("div.paginate em"))
    }

    fn next(&self, doc: &Html) -> NextProbe {
        let current = self
            .marker(doc)
            .and_then(|m| dom::parse_count(&m))
            .unwrap_or(1);
        let target = current + 1;

        let linked = doc
            .select(&dom::selector("div.paginate a"))
            .filter_map(|a| dom::text_of(a).parse::<u32>().ok())
            .any(|n| n == target);
        if !linked {
            return NextProbe::End;
        }

        NextProbe::Next(NextAction {
            label: target.to_string(),
            script: format!("loadComment({target});"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAGE: &str = r#"
      <ul class="board-body">
        <li class="notice-line">
          <span class="title"><a class="subject" href="/view/1">공지</a></span>
          <span class="comment"><a>999</a></span>
        </li>
        <li>
          <span class="title"><a class="subject" href="/view/5550001">첫 글</a></span>
          <span class="comment"><a>88</a></span>
        </li>
        <li>
          <span class="title"><a class="subject" href="/view/5550002">둘째 글</a></span>
          <span class="comment"><a>12</a></span>
        </li>
        <li class="ad-line">
          <span class="title"><a class="subject" href="/ads">광고</a></span>
        </li>
        <li>
          <span class="title"><a class="subject" href="/view/5550003">셋째 글</a></span>
          <span class="comment"><a>없음</a></span>
        </li>
      </ul>
    "#;

    #[test]
    fn list_summaries_skips_notices_and_ads() {
        let site = Ilbe::new();
        let doc = Html::parse_document(LIST_PAGE);
        let out = site.list_summaries(&doc);
        let ids: Vec<u64> = out.items.iter().map(|s| s.id).collect();
        assert_eq!(ids, [5_550_001, 5_550_002]);
        // The non-numeric comment counter is a parse failure, not an ad.
        assert_eq!(out.skipped, 1);
    }

    const DETAIL: &str = r#"
      <head>
        <meta property="og:title" content="일베 글 제목">
        <title>fallback title</title>
      </head>
      <body>
        <span class="nick">작성자닉</span>
        <span class="date">2025-05-26 11:22</span>
        <div class="post-content">
          <p>첫 문단</p>
          <p>  </p>
          <p>둘째 문단</p>
          <img src="https://img.example.com/1.jpg">
          <img src="https://img.example.com/2.jpg">
        </div>
        <span class="recomm-vote"><em>77</em></span>
        <span class="recomm-vote bad"><em>5</em></span>
      </body>
    "#;

    #[test]
    fn post_header_prefers_og_title_and_collects_images() {
        let site = Ilbe::new();
        let doc = Html::parse_document(DETAIL);
        let header = site.post_header(&doc).unwrap();
        assert_eq!(header.title, "일베 글 제목");
        assert_eq!(header.body_text, "첫 문단\n둘째 문단");
        assert_eq!(
            header.body_images,
            [
                "https://img.example.com/1.jpg",
                "https://img.example.com/2.jpg"
            ]
        );
        assert_eq!(header.likes, 77);
    }

    const COMMENT_PAGE: &str = r#"
      <div class="comment-item-box">
        <div class="comment-item">
          <span class="global-nick nick"><a>일베러1</a></span>
          <span class="date-line">10분 전</span>
          <span class="cmt">첫 댓글</span>
          <em id="cnt_good_1">4</em>
          <em id="cnt_bad_1">1</em>
        </div>
        <div class="comment-item">
          <span class="global-nick nick"><a>일베러2</a></span>
          <span class="date-line">5분 전</span>
          <span class="cmt">둘째 댓글</span>
        </div>
      </div>
      <div class="paginate"><em>1</em><a>2</a><a>3</a></div>
    "#;

    #[test]
    fn comments_carry_optional_vote_counts() {
        let flow = IlbeCommentFlow;
        let doc = Html::parse_document(COMMENT_PAGE);
        let out = flow.extract(&doc);
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].likes, Some(4));
        assert_eq!(out.items[0].dislikes, Some(1));
        assert!(out.items[1].likes.is_none());
    }

    #[test]
    fn next_uses_the_in_page_loader() {
        let flow = IlbeCommentFlow;
        let doc = Html::parse_document(COMMENT_PAGE);
        let NextProbe::Next(action) = flow.next(&doc) else {
            panic!("expected a next action");
        };
        assert_eq!(action.label, "2");
        assert_eq!(action.script, "loadComment(2);");
    }

    #[test]
    fn next_ends_past_the_last_linked_page() {
        let flow = IlbeCommentFlow;
        let doc = Html::parse_document(r#"<div class="paginate"><a>1</a><a>2</a><em>3</em></div>"#);
        assert_eq!(flow.next(&doc), NextProbe::End);
    }

    #[test]
    fn single_page_thread_has_no_next() {
        let flow = IlbeCommentFlow;
        let doc = Html::parse_document("<div class='comment-item-box'></div>");
        assert_eq!(flow.next(&doc), NextProbe::End);
    }
}
