use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use postboard::app::{ConsoleNotifier, Coordinator, Notifier};
use postboard::domain::{CommentDraft, FilterMode, Post, PostDraft, SortKey};
use postboard::infra::api::ReqwestHttpClient;
use postboard::types::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type App = Coordinator<ReqwestHttpClient, ConsoleNotifier>;

#[derive(Parser, Debug)]
#[command(name = "postboard")]
#[command(about = "RESTストア上の投稿とコメントを管理する", long_about = None)]
struct Cli {
    /// RESTストアのベースURL（環境変数・設定ファイルより優先）
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// 設定ファイルのパス（既定: postboard.yaml）
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 投稿一覧を表示する
    #[command(alias = "ls")]
    List {
        /// 削除状態での絞り込み（all / active / deleted）
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,

        /// タイトルの検索語
        #[arg(short, long, default_value = "")]
        search: String,

        /// 並び順（none / views / title）
        #[arg(long, default_value = "none")]
        sort: SortKey,
    },

    /// 統計情報を表示する
    Stats {
        /// 指定秒ごとに再取得して表示し続ける
        #[arg(short, long)]
        watch: Option<u64>,
    },

    /// 投稿の操作
    #[command(subcommand)]
    Post(PostCommand),

    /// コメントの操作
    #[command(subcommand)]
    Comment(CommentCommand),
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    /// 投稿を作成する
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        views: String,
    },
    /// 投稿を編集する（指定した項目のみ変更）
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        views: Option<String>,
    },
    /// 投稿を論理削除する
    Delete { id: String },
    /// 論理削除した投稿を復元する
    Restore { id: String },
    /// 投稿の詳細を表示し、閲覧数を1増やす
    View { id: String },
}

#[derive(Subcommand, Debug)]
enum CommentCommand {
    /// コメントを追加する
    Add {
        #[arg(short, long)]
        post: String,

        #[arg(short, long)]
        text: String,
    },
    /// コメントを編集する（指定した項目のみ変更）
    Edit {
        id: String,

        #[arg(short, long)]
        post: Option<String>,

        #[arg(short, long)]
        text: Option<String>,
    },
    /// コメントを論理削除する
    Delete { id: String },
    /// 論理削除したコメントを復元する
    Restore { id: String },
    /// 投稿に付いたコメントを表示する
    List { post: String },
}

// 通知済みのエラー（再表示しない）
#[derive(Debug, thiserror::Error)]
#[error("操作に失敗しました")]
struct Reported;

fn reported<T>(result: AppResult<T>) -> Result<T> {
    result.map_err(|_| Reported.into())
}

#[tokio::main]
async fn main() {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postboard=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {}
        Err(e) if e.is::<Reported>() => std::process::exit(1),
        Err(e) => {
            eprintln!("エラー: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref(), cli.api_url.as_deref())
        .context("設定の読み込みに失敗")?;
    tracing::info!(api_url = %config.api_url, "設定を読み込みました");

    let client = Arc::new(ReqwestHttpClient::new(config.api_url));
    let mut app: App = Coordinator::new(client, ConsoleNotifier);
    reported(app.refresh().await)?;

    match cli.command {
        Commands::List {
            filter,
            search,
            sort,
        } => {
            app.set_filter(filter);
            app.set_search(search);
            app.set_sort(sort);
            print_posts(&app);
        }
        Commands::Stats { watch } => {
            println!("{}", app.stats());
            if let Some(secs) = watch {
                watch_stats(&mut app, secs).await;
            }
        }
        Commands::Post(command) => run_post_command(&mut app, command).await?,
        Commands::Comment(command) => run_comment_command(&mut app, command).await?,
    }
    Ok(())
}

async fn run_post_command(app: &mut App, command: PostCommand) -> Result<()> {
    match command {
        PostCommand::Create { title, views } => {
            let draft = parse_post_form(app, &title, &views)?;
            let post = reported(app.save_post(draft).await)?;
            print_post_detail(&post);
        }
        PostCommand::Edit { id, title, views } => {
            let current = reported(app.begin_edit_post(&id))?;
            let title = title.unwrap_or(current.title);
            let views = views.unwrap_or_else(|| current.views.to_string());
            let draft = parse_post_form(app, &title, &views).inspect_err(|_| {
                app.cancel_post_edit();
            })?;
            let post = reported(app.save_post(draft).await)?;
            print_post_detail(&post);
        }
        PostCommand::Delete { id } => {
            reported(app.soft_delete_post(&id).await)?;
        }
        PostCommand::Restore { id } => {
            reported(app.restore_post(&id).await)?;
        }
        PostCommand::View { id } => {
            let post = reported(app.increment_views(&id).await)?;
            print_post_detail(&post);
            print_comments(app, &post.id);
        }
    }
    Ok(())
}

// フォーム入力の解析エラーも他のエラーと同様に通知する
fn parse_post_form(app: &App, title: &str, views: &str) -> Result<PostDraft> {
    PostDraft::from_form(title, views).map_err(|e| {
        app.notifier().error(&AppError::from(e));
        Reported.into()
    })
}

async fn run_comment_command(app: &mut App, command: CommentCommand) -> Result<()> {
    match command {
        CommentCommand::Add { post, text } => {
            let comment = reported(app.quick_comment(&post, &text).await)?;
            println!("ID: {} | 投稿: {}", comment.id, comment.post_id);
        }
        CommentCommand::Edit { id, post, text } => {
            let current = reported(app.begin_edit_comment(&id))?;
            let draft = CommentDraft::from_form(
                &post.unwrap_or(current.post_id),
                &text.unwrap_or(current.text),
            );
            reported(app.save_comment(draft).await)?;
        }
        CommentCommand::Delete { id } => {
            reported(app.soft_delete_comment(&id).await)?;
        }
        CommentCommand::Restore { id } => {
            reported(app.restore_comment(&id).await)?;
        }
        CommentCommand::List { post } => print_comments(app, &post),
    }
    Ok(())
}

// 統計情報を一定間隔で取り直して表示する（Ctrl-Cで終了）
async fn watch_stats(app: &mut App, secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    // 初回のtickは即時に完了するため読み飛ばす
    interval.tick().await;
    loop {
        interval.tick().await;
        if app.refresh().await.is_ok() {
            println!("{}", app.stats());
        }
    }
}

fn print_posts(app: &App) {
    let posts = app.visible_posts();
    if posts.is_empty() {
        println!("投稿が見つかりません");
        return;
    }

    for post in posts {
        let deleted = if post.is_deleted { " (削除済み)" } else { "" };
        println!(
            "[{}] {} 👁️ {}{} 💬 {}",
            post.id,
            post.title,
            post.views,
            deleted,
            app.state().comment_count(&post.id)
        );
    }
}

fn print_post_detail(post: &Post) {
    println!("ID: {}", post.id);
    println!("タイトル: {}", post.title);
    println!("閲覧数: {}", post.views);
    println!("作成: {}", format_date(post.created_at));
    if post.updated_at.is_some() {
        println!("更新: {}", format_date(post.updated_at));
    }
    if post.is_deleted && post.deleted_at.is_some() {
        println!("削除: {}", format_date(post.deleted_at));
    }
}

fn print_comments(app: &App, post_id: &str) {
    let comments = app.state().comments_for_post(post_id);
    if comments.is_empty() {
        println!("この投稿にはまだコメントがありません");
        return;
    }

    println!("💬 コメント:");
    for comment in comments {
        println!("  {}", comment.text);
        println!("    ID: {} | {}", comment.id, format_date(comment.created_at));
    }
}

// 日時が不明な場合は空文字列を表示する
fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.with_timezone(&Local).format("%Y/%m/%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
