//! 番茄小说下载命令行入口。
//!
//! 流程：加载配置 -> 初始化日志 -> 选择来源（镜像 API / 官网）-> 下载范围内章节 -> 导出 TXT。
//! `search` 子命令走官网搜索页，只列出候选书目。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use tomato_novel_fetch::base_system::config::load_or_create;
use tomato_novel_fetch::base_system::context::Config;
use tomato_novel_fetch::base_system::logging::{LogOptions, LogSystem};
use tomato_novel_fetch::download::downloader::Downloader;
use tomato_novel_fetch::download::models::ChapterRange;
use tomato_novel_fetch::download::source::{ApiSource, NovelSource};
use tomato_novel_fetch::download::store::{TxtStore, group_thousands};
use tomato_novel_fetch::network_parser::network::WebFallbackClient;
use tomato_novel_fetch::third_party::api_manager::NovelApiManager;
use tomato_novel_fetch::third_party::transport::{HttpTransport, ReqwestTransport};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "tomato-novel-fetch", version = VERSION)]
#[command(about = "番茄小说下载（多镜像 API / 官网页面）")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// 书籍 ID 或书籍页链接
    book: Option<String>,

    /// 使用官网页面抓取（默认按配置 use_api 决定）
    #[arg(long, default_value_t = false)]
    web: bool,

    /// 起始章节（从 1 开始）
    #[arg(long)]
    start: Option<usize>,

    /// 结束章节（含）
    #[arg(long)]
    end: Option<usize>,

    /// 导出路径（目录或 .txt 文件），缺省为配置中的保存目录
    #[arg(long)]
    output: Option<PathBuf>,

    /// 启用调试日志输出
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    /// 不在控制台输出日志（日志文件照常写入）
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,

    /// 数据目录路径（用于存放 config.yml 和 logs 等文件）
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 在官网搜索小说
    Search {
        /// 搜索关键词
        keyword: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("错误: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let data_dir = cli.data_dir.as_deref();
    let log = LogSystem::init_with_base(log_options(&cli), data_dir).map_err(|e| anyhow!(e))?;
    info!(target: "startup", "当前版本: v{}", VERSION);
    info!(target: "startup", "日志目录: {}", log.logs_dir().display());

    let config = load_or_create::<Config>(data_dir)
        .map_err(|e| anyhow!(e.to_string()))?
        .with_data_dir(data_dir);
    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::from_config(&config).context("创建 HTTP 客户端失败")?);

    if let Some(Command::Search { keyword }) = &cli.command {
        return search(&config, transport, keyword);
    }
    let Some(book) = cli.book.as_deref() else {
        return Err(anyhow!("请提供书籍 ID / 链接，或使用 search 子命令"));
    };

    let source: Arc<dyn NovelSource> = if cli.web || !config.use_api {
        info!("使用官网爬取模式");
        Arc::new(WebFallbackClient::from_config(&config, transport))
    } else {
        info!("使用 API 模式下载（无需字体解密）");
        Arc::new(ApiSource::new(NovelApiManager::from_config(&config, transport)))
    };

    let store = Arc::new(TxtStore::new());
    let downloader = Downloader::new(source, store.clone(), config.max_workers).with_progress(true);
    let range = ChapterRange {
        start: cli.start,
        end: cli.end,
    };

    let outcome = match downloader.run(book, range) {
        Ok(o) => o,
        Err(err) => {
            if let Some(hint) = err.hint() {
                eprintln!("{hint}");
            }
            return Err(err.into());
        }
    };

    println!(
        "下载完成！成功 {}/{} 章",
        outcome.result.success,
        outcome.result.total()
    );
    if outcome.result.success == 0 {
        return Ok(false);
    }

    let target = cli.output.unwrap_or_else(|| config.default_save_dir());
    let path = store
        .export(&outcome.meta.novel_id, &target)
        .context("导出 TXT 失败")?;
    println!("已导出到: {}", path.display());
    Ok(true)
}

fn search(config: &Config, transport: Arc<dyn HttpTransport>, keyword: &str) -> Result<bool> {
    let web = WebFallbackClient::from_config(config, transport);
    let books = match web.search(keyword) {
        Ok(books) => books,
        Err(err) if err.is_authorization() => {
            eprintln!("搜索被拦截，请在浏览器中完成验证或更新 Cookie 后重试");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    if books.is_empty() {
        println!("未找到相关小说");
        return Ok(true);
    }

    println!("\n搜索结果 (关键词: {keyword})");
    println!("{}", "=".repeat(60));
    for (idx, book) in books.iter().enumerate() {
        println!("\n{}. {}", idx + 1, book.title);
        println!("   作者: {}", book.author);
        println!("   小说ID: {}", book.novel_id);
        println!("   字数: {}", group_thousands(book.word_count));
        if !book.description.is_empty() {
            let brief: String = book.description.chars().take(100).collect();
            println!("   简介: {brief}...");
        }
    }
    Ok(true)
}

fn log_options(cli: &Cli) -> LogOptions {
    LogOptions {
        debug: cli.debug,
        use_color: true,
        archive_on_exit: true,
        console: !cli.quiet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomato_novel_fetch::base_system::logging::console_filter;
    use tracing_subscriber::filter::LevelFilter;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tomato-novel-fetch").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn debug_flag_raises_console_level() {
        assert_eq!(console_filter(&log_options(&parse(&["42"]))), LevelFilter::INFO);
        assert_eq!(
            console_filter(&log_options(&parse(&["42", "--debug"]))),
            LevelFilter::DEBUG
        );
        assert_eq!(
            console_filter(&log_options(&parse(&["--quiet", "42"]))),
            LevelFilter::OFF
        );
    }

    #[test]
    fn search_subcommand_takes_a_keyword() {
        let cli = parse(&["search", "星河", "--debug"]);
        assert!(cli.book.is_none());
        assert!(cli.debug);
        assert!(matches!(cli.command, Some(Command::Search { keyword }) if keyword == "星河"));
    }
}
