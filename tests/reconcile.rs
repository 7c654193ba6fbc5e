mod common;

use common::{Reply, ScriptedTransport, chapter_body, failover};
use tomato_novel_fetch::third_party::api_manager::NovelApiManager;
use tomato_novel_fetch::third_party::reconciler::ContentEndpoint;

const CHAPTER_URL: &str = "http://m1/api/chapter";
const CONTENT_URL: &str = "http://m1/api/content";

fn manager(t: &std::sync::Arc<ScriptedTransport>) -> NovelApiManager {
    NovelApiManager::new(failover(&["http://m1"], t.clone()))
}

#[test]
fn significantly_longer_content_wins_and_is_remembered() {
    let t = ScriptedTransport::new();
    t.on_param(CHAPTER_URL, "item_id", "1", chapter_body("第一章", 1000));
    t.on_param(CONTENT_URL, "item_id", "1", chapter_body("第一章", 1300));
    let api = manager(&t);

    let got = api.get_chapter_content("1", "42").unwrap();
    assert_eq!(got.content.chars().count(), 1300);
    assert_eq!(got.title, "第一章");
    assert_eq!(api.reconciler().preferred(), Some(ContentEndpoint::Content));
    assert_eq!(api.reconciler().preference().generation, 1);
}

#[test]
fn preferred_endpoint_is_used_alone_while_it_delivers() {
    let t = ScriptedTransport::new();
    t.on_param(CHAPTER_URL, "item_id", "1", chapter_body("一", 1000));
    t.on_param(CONTENT_URL, "item_id", "1", chapter_body("一", 1300));
    t.on_param(CONTENT_URL, "item_id", "2", chapter_body("二", 800));
    let api = manager(&t);
    api.get_chapter_content("1", "42").unwrap();

    t.reset_calls();
    let got = api.get_chapter_content("2", "42").unwrap();
    assert_eq!(got.content.chars().count(), 800);
    assert_eq!(t.urls(), vec![CONTENT_URL]);
    assert_eq!(api.reconciler().preferred(), Some(ContentEndpoint::Content));
}

#[test]
fn short_preferred_result_clears_preference_and_queries_both() {
    let t = ScriptedTransport::new();
    t.on_param(CHAPTER_URL, "item_id", "1", chapter_body("一", 1000));
    t.on_param(CONTENT_URL, "item_id", "1", chapter_body("一", 1300));
    t.on_param(CHAPTER_URL, "item_id", "2", chapter_body("二", 900));
    t.on_param(CONTENT_URL, "item_id", "2", chapter_body("二", 50));
    let api = manager(&t);
    api.get_chapter_content("1", "42").unwrap();

    t.reset_calls();
    let got = api.get_chapter_content("2", "42").unwrap();
    assert_eq!(t.count(CONTENT_URL), 2);
    assert_eq!(t.count(CHAPTER_URL), 1);
    assert_eq!(got.content.chars().count(), 900);
    // 900 > 50 * 1.2，chapter 成为新的首选
    assert_eq!(api.reconciler().preferred(), Some(ContentEndpoint::Chapter));
}

#[test]
fn close_lengths_do_not_set_a_preference() {
    let t = ScriptedTransport::new();
    t.on_param(CHAPTER_URL, "item_id", "1", chapter_body("一", 1000));
    t.on_param(CONTENT_URL, "item_id", "1", chapter_body("一", 1100));
    let api = manager(&t);

    let got = api.get_chapter_content("1", "42").unwrap();
    assert_eq!(got.content.chars().count(), 1100);
    assert_eq!(api.reconciler().preferred(), None);
}

#[test]
fn unauthorized_endpoint_does_not_block_the_other() {
    let t = ScriptedTransport::new();
    t.on(CHAPTER_URL, Reply::Status(401, "{\"message\":\"token\"}".into()));
    t.on(CONTENT_URL, chapter_body("一", 300));
    let api = manager(&t);

    let got = api.get_chapter_content("1", "42").unwrap();
    assert_eq!(got.content.chars().count(), 300);
    assert_eq!(api.reconciler().preferred(), None);
}

#[test]
fn both_endpoints_empty_yield_nothing() {
    let t = ScriptedTransport::new();
    t.on(CHAPTER_URL, Reply::json(serde_json::json!({"code": 200, "data": {"content": ""}})));
    t.on(CONTENT_URL, Reply::Status(500, String::new()));
    let api = manager(&t);
    assert!(api.get_chapter_content("1", "42").is_none());
}

#[test]
fn content_endpoint_carries_its_tab_and_optional_book_id() {
    let t = ScriptedTransport::new();
    t.on(CHAPTER_URL, chapter_body("一", 200));
    t.on(CONTENT_URL, chapter_body("一", 200));
    let api = manager(&t);
    api.get_chapter_content("9", "").unwrap();

    let calls = t.calls();
    let content = calls.iter().find(|c| c.url == CONTENT_URL).unwrap();
    assert_eq!(content.param("tab"), Some("小说"));
    assert_eq!(content.param("item_id"), Some("9"));
    assert!(calls.iter().all(|c| c.param("book_id").is_none()));
}

#[test]
fn html_in_the_winner_is_cleaned() {
    let t = ScriptedTransport::new();
    t.on(
        CHAPTER_URL,
        Reply::json(serde_json::json!({"code": 200, "data": {
            "title": "序",
            "content": "<p>第一段<img src=\"a.png\"></p><p>第二段</p>"
        }})),
    );
    t.on(CONTENT_URL, Reply::Status(404, String::new()));
    let api = manager(&t);

    let got = api.get_chapter_content("1", "42").unwrap();
    assert_eq!(got.content, "第一段\n第二段");
}
