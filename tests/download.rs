mod common;

use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use common::{Reply, ScriptedTransport, failover};
use tomato_novel_fetch::download::downloader::{DownloadError, Downloader};
use tomato_novel_fetch::download::models::ChapterRange;
use tomato_novel_fetch::download::source::ApiSource;
use tomato_novel_fetch::download::store::TxtStore;
use tomato_novel_fetch::third_party::api_manager::NovelApiManager;

const CHAPTER_URL: &str = "http://m1/api/chapter";

fn scripted_book() -> Arc<ScriptedTransport> {
    let t = ScriptedTransport::new();
    t.on(
        "http://m1/api/detail",
        Reply::json(json!({"code": 200, "data": {"data": {
            "book_id": "42", "book_name": "测试书", "author": "某人",
            "abstract": "一本书", "word_count": 123456, "chapter_count": 3
        }}})),
    );
    t.on(
        "http://m1/api/book",
        Reply::json(json!({"code": 200, "data": [
            {"itemId": "a", "title": "第一章"},
            {"itemId": "b", "title": "第二章"},
            {"itemId": "c", "title": "第三章"}
        ]})),
    );
    let body = |title: &str, text: &str| {
        Reply::json(json!({"code": 200, "data": {"title": title, "content": text}}))
    };
    t.on_param(CHAPTER_URL, "item_id", "a", body("第一章 开端", "<p>甲</p>"));
    t.on_param(CHAPTER_URL, "item_id", "b", body("第二章", "<p>乙</p>"));
    t.on_param(CHAPTER_URL, "item_id", "c", body("", "<p>丙</p>"));
    t.on("http://m1/api/content", Reply::Status(404, String::new()));
    t
}

fn downloader(t: &Arc<ScriptedTransport>, store: &Arc<TxtStore>) -> Downloader {
    let api = NovelApiManager::new(failover(&["http://m1"], t.clone()));
    Downloader::new(Arc::new(ApiSource::new(api)), store.clone(), 3)
}

#[test]
fn downloads_every_chapter_and_exports_in_order() {
    let t = scripted_book();
    let store = Arc::new(TxtStore::new());
    let outcome = downloader(&t, &store)
        .run("https://fanqienovel.com/page/42", ChapterRange::default())
        .unwrap();

    assert_eq!(outcome.meta.title, "测试书");
    assert_eq!(outcome.result.success, 3);
    assert_eq!(outcome.result.failed, 0);

    let chapters = store.chapters("42");
    let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
    // 上游标题为空时沿用目录标题
    assert_eq!(titles, vec!["第一章 开端", "第二章", "第三章"]);
    assert_eq!(chapters[0].content, "甲");
    assert_eq!(chapters[0].word_count, 1);

    let dir = TempDir::new().unwrap();
    let path = store.export("42", dir.path()).unwrap();
    assert_eq!(path, dir.path().join("测试书.txt"));
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("作者: 某人\n"));
    assert!(text.contains("字数: 123,456 字\n"));
    let (a, b, c) = (
        text.find("甲").unwrap(),
        text.find("乙").unwrap(),
        text.find("丙").unwrap(),
    );
    assert!(a < b && b < c);
}

#[test]
fn range_limits_the_chapters_fetched() {
    let t = scripted_book();
    let store = Arc::new(TxtStore::new());
    let range = ChapterRange {
        start: Some(2),
        end: Some(2),
    };
    let outcome = downloader(&t, &store).run("42", range).unwrap();

    assert_eq!(outcome.result.total(), 1);
    assert_eq!(store.chapters("42")[0].chapter_id, "b");
    assert!(t.calls().iter().all(|c| c.param("item_id") != Some("a")));
}

#[test]
fn failed_chapters_are_counted_not_fatal() {
    let t = ScriptedTransport::new();
    t.on("http://m1/api/detail", Reply::json(json!({"code": 200, "data": {"book_name": "残"}})));
    t.on("http://m1/api/book", Reply::json(json!({"code": 200, "data": ["x", "y"]})));
    t.on_param(
        CHAPTER_URL,
        "item_id",
        "x",
        Reply::json(json!({"code": 200, "data": {"content": "有"}})),
    );
    t.on_param(CHAPTER_URL, "item_id", "y", Reply::Status(500, String::new()));
    t.on("http://m1/api/content", Reply::Status(404, String::new()));
    let store = Arc::new(TxtStore::new());

    let outcome = downloader(&t, &store).run("5", ChapterRange::default()).unwrap();
    assert_eq!(outcome.result.success, 1);
    assert_eq!(outcome.result.failed, 1);
    assert_eq!(store.chapters("5")[0].title, "第1章");
}

#[test]
fn inverted_range_is_an_error() {
    let t = scripted_book();
    let store = Arc::new(TxtStore::new());
    let range = ChapterRange {
        start: Some(3),
        end: Some(1),
    };
    assert!(matches!(
        downloader(&t, &store).run("42", range),
        Err(DownloadError::EmptyRange { total: 3 })
    ));
}

#[test]
fn rejected_credentials_come_with_a_hint() {
    let t = ScriptedTransport::new();
    t.on("http://m1/api/detail", Reply::Status(401, String::new()));
    let store = Arc::new(TxtStore::new());

    let err = downloader(&t, &store)
        .run("42", ChapterRange::default())
        .unwrap_err();
    assert!(matches!(err, DownloadError::Metadata(_)));
    assert!(err.hint().is_some());
}

#[test]
fn empty_chapter_list_stops_the_run() {
    let t = ScriptedTransport::new();
    t.on("http://m1/api/detail", Reply::json(json!({"code": 200, "data": {"book_name": "X"}})));
    t.on("http://m1/api/book", Reply::json(json!({"code": 200, "data": []})));
    let store = Arc::new(TxtStore::new());

    assert!(matches!(
        downloader(&t, &store).run("42", ChapterRange::default()),
        Err(DownloadError::EmptyChapterList)
    ));
}
