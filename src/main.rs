use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use postflow::api::{AccountActions, HttpBackend};
use postflow::composer::Composer;
use postflow::config::{Config, DEFAULT_CONFIG_FILE};
use postflow::core::{
    Attachment,
    FeedScope,
    FileSession,
    PostBackend,
    PostId,
    SessionStore,
    SignIn,
    ACCESS_TOKEN_KEY,
};
use postflow::detail::PostDetail;
use postflow::publish::{CompletionEffects, CompletionWatcher, Observation, PostPublisher};
use postflow::uploaders::HttpBlobStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "postflow", about = "Publish photo posts from the command line")]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files and publish them as one post
    Post {
        /// Files to attach, in display order
        files: Vec<PathBuf>,
        #[arg(long, default_value = "")]
        caption: String,
    },
    /// List posts, optionally for one user
    Feed {
        #[arg(long)]
        username: Option<String>,
    },
    /// Like or unlike a post
    Like {
        post_id: String,
    },
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    SignOut,
    Profile {
        username: String,
    },
}

/// 命令行下的"对话框": 关闭时打印, 刷新时拉取动态流
struct CliEffects {
    backend: Arc<HttpBackend>,
    session: Arc<FileSession>,
}

#[async_trait]
impl CompletionEffects for CliEffects {
    async fn close_dialog(&self) {
        println!("Post published");
    }

    async fn refresh_feed(&self, scope: FeedScope) {
        let token = self.session.get(ACCESS_TOKEN_KEY);
        match self.backend.list_posts(token.as_deref(), &scope).await {
            Ok(posts) => println!("Feed refreshed ({:?}): {} posts", scope, posts.len()),
            Err(err) => tracing::warn!(%err, "feed refresh failed"),
        }
    }

    async fn report_failure(&self, message: &str) {
        eprintln!("Could not publish post: {}", message);
    }
}

async fn publish(config: &Config, backend: Arc<HttpBackend>, session: Arc<FileSession>, files: Vec<PathBuf>, caption: String) -> anyhow::Result<()> {
    let mut attachments = Vec::with_capacity(files.len());
    for path in &files {
        let attachment = Attachment::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        attachments.push(attachment);
    }

    let mut composer = Composer::new();
    composer.select_files(attachments);
    composer.next();
    composer.set_caption(caption);
    if !composer.can_post() {
        bail!("Nothing to post");
    }

    let blob_store = HttpBlobStore::new(&config.blob.endpoint, config.blob.public_base.as_deref(), config.timeout())?;
    let publisher = PostPublisher::new(Arc::new(blob_store), backend.clone(), session.clone())
        .with_prefix(config.blob.prefix.clone());

    let effects = Arc::new(CliEffects { backend, session });
    let watcher = CompletionWatcher::spawn(publisher.store().subscribe(), config.viewer(), effects);
    let mut events = watcher.subscribe();

    let (attachments, caption) = composer.take_submission();
    if let Ok(dispatch) = publisher.publish(attachments, &caption).await {
        // 结果由 watcher 处理
        let _ = dispatch.wait().await;
    }

    let published = loop {
        let observation = events.recv().await?;
        composer.observe(&observation);
        match observation {
            Observation::Completed { .. } => break true,
            Observation::Failed { .. } => break false,
            _ => {}
        }
    };

    drop(publisher);
    watcher.join().await?;

    if !published {
        bail!("Publishing failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("Failed to load configuration")?;
    let session = Arc::new(FileSession::open(&config.session.path)?);
    let backend = Arc::new(HttpBackend::new(&config.api.endpoint, config.timeout())?);

    match cli.command {
        Commands::Post { files, caption } => {
            publish(&config, backend, session, files, caption).await?;
        }
        Commands::Feed { username } => {
            let scope = username.map(FeedScope::Profile).unwrap_or(FeedScope::All);
            let token = session.get(ACCESS_TOKEN_KEY);
            for post in backend.list_posts(token.as_deref(), &scope).await? {
                println!("{}\t{}\t{} likes\t{}", post.post_id, post.user.username, post.likes.len(), post.caption);
            }
        }
        Commands::Like { post_id } => {
            let token = session.get(ACCESS_TOKEN_KEY);
            let post_id = PostId::new(post_id);
            let post = backend
                .list_posts(token.as_deref(), &FeedScope::All)
                .await?
                .into_iter()
                .find(|post| post.post_id == post_id)
                .with_context(|| format!("Post {} not found", post_id))?;

            let viewer_id = session.get(postflow::core::USER_ID_KEY);
            let mut detail = PostDetail::new(post, viewer_id.as_deref());
            detail.toggle_like(backend.as_ref(), session.as_ref()).await?;
            println!("{} likes, liked: {}", detail.like_count(), detail.is_liked());
        }
        Commands::SignIn { email, password } => {
            let actions = AccountActions::new(backend, session);
            let profile = actions.sign_in(&SignIn { email, password }).await?;
            println!("Signed in as {}", profile.username);
        }
        Commands::SignOut => {
            AccountActions::new(backend, session).sign_out();
            println!("Signed out");
        }
        Commands::Profile { username } => {
            let profile = AccountActions::new(backend, session).get_profile(&username).await?;
            println!("{:#?}", profile);
        }
    }

    Ok(())
}
