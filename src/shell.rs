//! Interactive shell
//!
//! One shell run is one client tab: a single session and one instance of
//! each page. Lines are tokenized with simple quoting rules and parsed with
//! clap, so every command has `--help`.

use clap::{CommandFactory, Parser, Subcommand};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::api::{Comment, Id};
use crate::app::App;
use crate::effect::{Commit, LoadState, Snapshot};
use crate::pages::{AuthPage, FeedPage, FeedScope, PageError, PostPage, ProfilePage, Tab};
use crate::session::Session;
use crate::views::{EntityView, MutationOutcome, ViewError};

#[derive(Parser, Debug)]
#[command(name = "social", no_binary_name = true, disable_help_subcommand = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Create an account and sign in
    Signup {
        name: String,
        email: String,
        password: String,
    },
    /// Sign in
    Login { email: String, password: String },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List posts
    Feed {
        /// Only posts by this user
        #[arg(long)]
        author: Option<String>,
    },
    /// Show, write, edit or delete a post
    Post {
        #[command(subcommand)]
        action: PostAction,
    },
    /// Show the comments of a post
    Comments { post_id: String },
    /// Write, edit or delete a comment
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
    /// Show a user (yourself by default)
    Profile { id: Option<String> },
    /// Users following a user (the open profile by default)
    Followers { id: Option<String> },
    /// Users a user follows (the open profile by default)
    Followings { id: Option<String> },
    /// Follow a user
    Follow { id: String },
    /// Stop following a user
    Unfollow { id: String },
    /// Edit or delete your account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// List commands
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug)]
enum PostAction {
    Show { id: String },
    New {
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum CommentAction {
    New {
        post_id: String,
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum AccountAction {
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete,
    Password { password: String },
}

impl ShellCommand {
    fn mutates(&self) -> bool {
        match self {
            ShellCommand::Post { action } => !matches!(action, PostAction::Show { .. }),
            ShellCommand::Comment { .. }
            | ShellCommand::Follow { .. }
            | ShellCommand::Unfollow { .. }
            | ShellCommand::Account { .. } => true,
            _ => false,
        }
    }
}

/// Whether the shell keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    app: App,
    out: W,
    auth: AuthPage,
    feed: FeedPage,
    post: PostPage,
    profile: ProfilePage,
}

impl<W: Write> Shell<W> {
    pub fn new(app: App, out: W) -> Self {
        Self {
            auth: app.auth(),
            feed: app.feed(),
            post: app.post_page(),
            profile: app.profile(),
            app,
            out,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        self.prompt()?;
        while let Some(line) = lines.next_line().await? {
            if self.execute(&line).await? == Flow::Quit {
                break;
            }
            self.prompt()?;
        }
        Ok(())
    }

    fn prompt(&mut self) -> io::Result<()> {
        match self.app.session().auth() {
            Some(session) => write!(self.out, "{}@social> ", session.user.name)?,
            None => write!(self.out, "social> ")?,
        }
        self.out.flush()
    }

    /// Run one command line
    pub async fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let words = match split_words(line) {
            Ok(words) if words.is_empty() => return Ok(Flow::Continue),
            Ok(words) => words,
            Err(e) => {
                writeln!(self.out, "error: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(e) => {
                write!(self.out, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
        };

        if command.mutates() && !self.app.session().is_authenticated() {
            writeln!(self.out, "error: log in first")?;
            return Ok(Flow::Continue);
        }

        match self.dispatch(command).await {
            Ok(flow) => Ok(flow),
            Err(ShellFailure::Io(e)) => Err(e),
            Err(ShellFailure::Page(e)) => {
                writeln!(self.out, "error: {e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn dispatch(&mut self, command: ShellCommand) -> Result<Flow, ShellFailure> {
        match command {
            ShellCommand::Signup {
                name,
                email,
                password,
            } => {
                let session = self.auth.signup(&name, &email, &password).await?;
                self.signed_in(&session)?;
            }
            ShellCommand::Login { email, password } => {
                let session = self.auth.login(&email, &password).await?;
                self.signed_in(&session)?;
            }
            ShellCommand::Logout => {
                self.auth.logout();
                writeln!(self.out, "signed out")?;
            }
            ShellCommand::Whoami => match self.app.session().auth() {
                Some(session) => writeln!(self.out, "{}", session.user)?,
                None => writeln!(self.out, "anonymous")?,
            },
            ShellCommand::Feed { author } => {
                let scope = match author {
                    Some(id) => FeedScope::ByAuthor(Id::from(id)),
                    None => FeedScope::All,
                };
                if self.feed.open(scope).await == Commit::Unchanged {
                    self.feed.refresh().await;
                }
                self.print_feed()?;
            }
            ShellCommand::Post { action } => self.post_command(action).await?,
            ShellCommand::Comments { post_id } => {
                self.open_post(Id::from(post_id)).await;
                if self.post.comments_shown() {
                    self.post.refresh_comments().await;
                } else {
                    self.post.toggle_comments().await;
                }
                self.print_comments()?;
            }
            ShellCommand::Comment { action } => self.comment_command(action).await?,
            ShellCommand::Profile { id } => {
                let id = match id {
                    Some(id) => Id::from(id),
                    None => self.app.session().user_id().ok_or(PageError::Anonymous)?,
                };
                self.open_profile(id).await;
                self.print_profile()?;
            }
            ShellCommand::Followers { id } => self.tab_command(Tab::Followers, id).await?,
            ShellCommand::Followings { id } => self.tab_command(Tab::Followings, id).await?,
            ShellCommand::Follow { id } => {
                self.open_profile(Id::from(id.as_str())).await;
                self.profile.follow().await?;
                writeln!(self.out, "following {id}")?;
            }
            ShellCommand::Unfollow { id } => {
                self.open_profile(Id::from(id.as_str())).await;
                self.profile.unfollow().await?;
                writeln!(self.out, "no longer following {id}")?;
            }
            ShellCommand::Account { action } => self.account_command(action).await?,
            ShellCommand::Help => {
                let help = Line::command().render_help();
                writeln!(self.out, "{help}")?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn post_command(&mut self, action: PostAction) -> Result<(), ShellFailure> {
        match action {
            PostAction::Show { id } => {
                self.open_post(Id::from(id)).await;
                self.print_post()?;
            }
            PostAction::New { content } => {
                if self.feed.scope().is_none() {
                    self.feed.open(FeedScope::All).await;
                }
                self.feed.create_post(&content.join(" ")).await?;
                writeln!(self.out, "post created")?;
                self.print_feed()?;
            }
            PostAction::Edit { id, content } => {
                self.open_post(Id::from(id)).await;
                let mut view = self.post.view().ok_or(PageError::NotLoaded)?;
                view.begin_edit()?.content = content.join(" ");
                let outcome = view.commit().await.map_err(PageError::from);
                let outcome = self.settle(outcome).await?;
                self.report(outcome)?;
                self.print_post()?;
            }
            PostAction::Delete { id } => {
                self.open_post(Id::from(id)).await;
                let view = self.post.view().ok_or(PageError::NotLoaded)?;
                let outcome = view.delete().await.map_err(PageError::from);
                let outcome = self.settle(outcome).await?;
                self.report(outcome)?;
            }
        }
        Ok(())
    }

    async fn comment_command(&mut self, action: CommentAction) -> Result<(), ShellFailure> {
        match action {
            CommentAction::New { post_id, content } => {
                self.open_post(Id::from(post_id)).await;
                self.post.create_comment(&content.join(" ")).await?;
                writeln!(self.out, "comment created")?;
                self.print_comments()?;
            }
            CommentAction::Edit { id, content } => {
                let mut view = self.comment_view(Id::from(id)).await?;
                view.begin_edit()?.content = content.join(" ");
                let outcome = view.commit().await.map_err(PageError::from);
                let outcome = self.settle_comment(outcome).await?;
                self.report(outcome)?;
                self.print_comments()?;
            }
            CommentAction::Delete { id } => {
                let view = self.comment_view(Id::from(id)).await?;
                let outcome = view.delete().await.map_err(PageError::from);
                let outcome = self.settle_comment(outcome).await?;
                self.report(outcome)?;
            }
        }
        Ok(())
    }

    async fn account_command(&mut self, action: AccountAction) -> Result<(), ShellFailure> {
        let own = self.app.session().user_id().ok_or(PageError::Anonymous)?;
        match action {
            AccountAction::Edit { name, email } => {
                self.open_profile(own).await;
                let mut view = self.profile.view().ok_or(PageError::NotLoaded)?;
                let draft = view.begin_edit()?;
                if let Some(name) = name {
                    draft.name = name;
                }
                if let Some(email) = email {
                    draft.email = email;
                }
                let outcome = view.commit().await.map_err(PageError::from);
                let outcome = self.settle(outcome).await?;
                self.report(outcome)?;
                self.print_profile()?;
            }
            AccountAction::Delete => {
                self.open_profile(own).await;
                let view = self.profile.view().ok_or(PageError::NotLoaded)?;
                let outcome = view.delete().await.map_err(PageError::from);
                let outcome = self.settle(outcome).await?;
                self.report(outcome)?;
            }
            AccountAction::Password { password } => {
                self.profile.change_password(&password).await?;
                writeln!(self.out, "password changed")?;
            }
        }
        Ok(())
    }

    async fn tab_command(&mut self, tab: Tab, id: Option<String>) -> Result<(), ShellFailure> {
        let id = match id {
            Some(id) => Id::from(id),
            None => match self.profile.snapshot().data {
                Some(user) => user.id.clone(),
                None => self.app.session().user_id().ok_or(PageError::NotLoaded)?,
            },
        };
        self.open_profile(id).await;
        self.profile.select_tab(tab).await;

        let snapshot = self.profile.tab_snapshot(tab);
        self.print_failure(&snapshot)?;
        let users = self.profile.listed(tab);
        if users.is_empty() {
            writeln!(self.out, "(nobody)")?;
        }
        for user in users.iter() {
            writeln!(self.out, "{user}")?;
        }
        Ok(())
    }

    async fn open_post(&self, id: Id) {
        if self.post.open(id).await == Commit::Unchanged {
            self.post.refresh().await;
        }
    }

    async fn open_profile(&self, id: Id) {
        if self.profile.open(id).await == Commit::Unchanged {
            self.profile.refresh().await;
        }
    }

    async fn comment_view(&self, id: Id) -> Result<EntityView<Comment>, ShellFailure> {
        if let Some(view) = self.post.comment_view(&id) {
            return Ok(view);
        }
        let comment = self
            .app
            .client()
            .get_comment(&id)
            .await
            .map_err(PageError::from)?;
        Ok(EntityView::new(comment, self.app.session().clone()))
    }

    /// Refresh every page showing data a post or user mutation touched
    async fn settle(
        &self,
        result: Result<MutationOutcome, PageError>,
    ) -> Result<MutationOutcome, PageError> {
        let outcome = result?;
        if self.feed.scope().is_some() {
            self.feed.apply(Ok(outcome)).await;
        }
        if self.post.snapshot().data.is_some() {
            self.post.apply(Ok(outcome)).await;
        }
        if self.profile.snapshot().data.is_some() {
            self.profile.apply(Ok(outcome)).await;
        }
        Ok(outcome)
    }

    async fn settle_comment(
        &self,
        result: Result<MutationOutcome, PageError>,
    ) -> Result<MutationOutcome, PageError> {
        let outcome = result?;
        self.post.apply_comment(Ok(outcome)).await;
        Ok(outcome)
    }

    fn signed_in(&mut self, session: &Arc<Session>) -> io::Result<()> {
        writeln!(self.out, "signed in as {}", session.user)
    }

    fn report(&mut self, outcome: MutationOutcome) -> io::Result<()> {
        let message = match outcome {
            MutationOutcome::Created => "created",
            MutationOutcome::Updated => "updated",
            MutationOutcome::Deleted => "deleted",
            MutationOutcome::Followed => "followed",
            MutationOutcome::Unfollowed => "unfollowed",
            MutationOutcome::Unchanged => "nothing changed",
            MutationOutcome::SessionCleared => "account deleted; signed out",
        };
        writeln!(self.out, "{message}")
    }

    fn print_failure<T>(&mut self, snapshot: &Snapshot<T>) -> io::Result<()> {
        if snapshot.state == LoadState::Error {
            if let Some(error) = &snapshot.error {
                writeln!(self.out, "error: {error}")?;
            }
        }
        Ok(())
    }

    fn print_feed(&mut self) -> io::Result<()> {
        let snapshot = self.feed.snapshot();
        self.print_failure(&snapshot)?;
        let posts = self.feed.posts();
        if posts.is_empty() {
            writeln!(self.out, "(no posts)")?;
        }
        for post in posts.iter() {
            writeln!(self.out, "{post}")?;
        }
        Ok(())
    }

    fn print_post(&mut self) -> io::Result<()> {
        let snapshot = self.post.snapshot();
        self.print_failure(&snapshot)?;
        if let Some(post) = snapshot.data {
            writeln!(self.out, "{post}")?;
        }
        Ok(())
    }

    fn print_comments(&mut self) -> io::Result<()> {
        let snapshot = self.post.comments_snapshot();
        self.print_failure(&snapshot)?;
        let comments = self.post.comments();
        if comments.is_empty() {
            writeln!(self.out, "  (no comments)")?;
        }
        for comment in comments.iter() {
            writeln!(self.out, "{comment}")?;
        }
        Ok(())
    }

    fn print_profile(&mut self) -> io::Result<()> {
        let snapshot = self.profile.snapshot();
        self.print_failure(&snapshot)?;
        if let Some(user) = snapshot.data {
            writeln!(self.out, "{user}")?;
            if self.profile.follow_controls().is_some() {
                writeln!(self.out, "  (follow {0} / unfollow {0})", user.id)?;
            }
        }
        Ok(())
    }
}

enum ShellFailure {
    Io(io::Error),
    Page(PageError),
}

impl From<io::Error> for ShellFailure {
    fn from(e: io::Error) -> Self {
        ShellFailure::Io(e)
    }
}

impl From<PageError> for ShellFailure {
    fn from(e: PageError) -> Self {
        ShellFailure::Page(e)
    }
}

impl From<ViewError> for ShellFailure {
    fn from(e: ViewError) -> Self {
        ShellFailure::Page(e.into())
    }
}

/// Split a command line into words
///
/// Whitespace separates words; single or double quotes group them and a
/// backslash escapes the next character outside single quotes.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => word.push(c),
            (_, '\\') => match chars.next() {
                Some(escaped) => {
                    word.push(escaped);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => word.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            (None, c) => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}
