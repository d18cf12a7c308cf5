use std::fs;
use std::io;
use std::process;

use clap::{crate_authors, crate_version, Arg, ArgMatches, Command};
use env_logger::Env;
use indicatif::ProgressBar;
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use tumblr::{AvatarSize, Credentials, Params, TumblrClient};

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Tumblr(#[from] tumblr::Error),

    #[error("Could not write output: {0}")]
    Io(#[from] io::Error),

    #[error("Could not print result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    BadArgument(String),
}

type CliResult = Result<(), CliError>;

fn blog_arg() -> Arg<'static> {
    Arg::new("BLOG")
        .help("Blog name or hostname, e.g. staff or staff.tumblr.com")
        .required(true)
}

fn id_arg() -> Arg<'static> {
    Arg::new("ID").help("Post id").required(true)
}

fn key_arg() -> Arg<'static> {
    Arg::new("REBLOG_KEY")
        .help("Reblog key of the post")
        .required(true)
}

fn cli() -> Command<'static> {
    Command::new("tumblr")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Talks to the Tumblr v2 API.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("credentials")
                .short('c')
                .long("credentials")
                .value_name("FILE")
                .help("JSON file with consumer_key, consumer_secret, oauth_key and oauth_secret")
                .takes_value(true),
        )
        .arg(
            Arg::new("param")
                .short('p')
                .long("param")
                .value_name("KEY=VALUE")
                .help("Extra request parameter, passed through as is")
                .takes_value(true)
                .multiple_occurrences(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Prints extra information, used for debugging"),
        )
        .subcommand(Command::new("info").about("Blog information").arg(blog_arg()))
        .subcommand(
            Command::new("avatar")
                .about("Download a blog's avatar")
                .arg(blog_arg())
                .arg(
                    Arg::new("size")
                        .short('s')
                        .long("size")
                        .help("16, 24, 30, 40, 48, 64, 96, 128 or 512")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Where to write the image, defaults to <blog>.png")
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new("likes")
                .about("Posts a blog has liked")
                .arg(blog_arg())
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help("Follow pagination until every like is fetched"),
                ),
        )
        .subcommand(Command::new("followers").about("Followers of a blog").arg(blog_arg()))
        .subcommand(Command::new("posts").about("Published posts of a blog").arg(blog_arg()))
        .subcommand(Command::new("queue").about("Queued posts of a blog").arg(blog_arg()))
        .subcommand(Command::new("drafts").about("Draft posts of a blog").arg(blog_arg()))
        .subcommand(Command::new("submissions").about("Submissions to a blog").arg(blog_arg()))
        .subcommand(
            Command::new("post")
                .about("Create a post")
                .arg(blog_arg())
                .arg(Arg::new("type").long("type").takes_value(true).default_value("text"))
                .arg(Arg::new("state").long("state").takes_value(true))
                .arg(Arg::new("title").long("title").takes_value(true))
                .arg(Arg::new("body").long("body").takes_value(true))
                .arg(
                    Arg::new("tags")
                        .long("tags")
                        .help("Comma separated tags")
                        .takes_value(true),
                ),
        )
        .subcommand(Command::new("edit").about("Edit a post").arg(blog_arg()).arg(id_arg()))
        .subcommand(
            Command::new("reblog")
                .about("Reblog a post onto a blog")
                .arg(blog_arg())
                .arg(id_arg())
                .arg(key_arg()),
        )
        .subcommand(Command::new("delete").about("Delete a post").arg(blog_arg()).arg(id_arg()))
        .subcommand(Command::new("user").about("The authenticated user"))
        .subcommand(Command::new("dashboard").about("The authenticated user's dashboard"))
        .subcommand(Command::new("user-likes").about("Posts the authenticated user liked"))
        .subcommand(Command::new("following").about("Blogs the authenticated user follows"))
        .subcommand(Command::new("follow").about("Follow a blog").arg(blog_arg()))
        .subcommand(Command::new("unfollow").about("Unfollow a blog").arg(blog_arg()))
        .subcommand(Command::new("like").about("Like a post").arg(id_arg()).arg(key_arg()))
        .subcommand(Command::new("unlike").about("Unlike a post").arg(id_arg()).arg(key_arg()))
        .subcommand(
            Command::new("tagged")
                .about("Public posts with a tag")
                .arg(Arg::new("TAG").required(true)),
        )
}

fn parse_params(matches: &ArgMatches) -> Result<Params, CliError> {
    let mut params = Params::new();

    for raw in matches.values_of("param").into_iter().flatten() {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| CliError::BadArgument(format!("Expected KEY=VALUE, got '{}'", raw)))?;
        params.insert(key, value);
    }

    Ok(params)
}

fn credentials(matches: &ArgMatches) -> Result<Credentials, CliError> {
    let creds = match matches.value_of("credentials") {
        Some(path) => Credentials::from_file(path)?,
        None => Credentials::from_env()?,
    };

    Ok(creds)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, CliError> {
    matches
        .value_of(name)
        .ok_or_else(|| CliError::BadArgument(format!("Missing {}", name)))
}

fn post_id(matches: &ArgMatches) -> Result<u64, CliError> {
    let raw = required(matches, "ID")?;
    raw.parse()
        .map_err(|_| CliError::BadArgument(format!("Invalid post id '{}'", raw)))
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn avatar(client: &TumblrClient, matches: &ArgMatches) -> CliResult {
    let blog = required(matches, "BLOG")?;

    let image = match matches.value_of("size") {
        Some(raw) => {
            let pixels: u16 = raw
                .parse()
                .map_err(|_| CliError::BadArgument(format!("Invalid size '{}'", raw)))?;
            client
                .blog_avatar_and_size(blog, AvatarSize::try_from(pixels)?)
                .await?
        }
        None => client.blog_avatar(blog).await?,
    };

    let output = matches
        .value_of("output")
        .map(String::from)
        .unwrap_or_else(|| format!("{}.png", blog));

    fs::write(&output, &image)?;
    info!("Wrote {} bytes to {}", image.len(), output);

    Ok(())
}

async fn likes(client: &TumblrClient, blog: &str, params: Params, all: bool) -> CliResult {
    let first = client.blog_likes(blog, &params).await?;

    if !all {
        return print_json(&first);
    }

    let bar = ProgressBar::new(first.liked_count);
    bar.inc(first.liked_posts.len() as u64);

    let mut next = first.links.as_ref().and_then(|l| l.next_params());
    let mut posts = first.liked_posts;

    while let Some(page) = next {
        debug!("Fetching next page of likes: {:?}", page);

        let res = client.blog_likes(blog, &params.merged(&page)).await?;
        if res.liked_posts.is_empty() {
            break;
        }

        bar.inc(res.liked_posts.len() as u64);
        next = res.links.as_ref().and_then(|l| l.next_params());
        posts.extend(res.liked_posts);
    }

    bar.finish();
    print_json(&posts)
}

async fn run(matches: &ArgMatches) -> CliResult {
    let client = TumblrClient::with_credentials(credentials(matches)?);
    let params = parse_params(matches)?;

    match matches.subcommand() {
        Some(("info", m)) => print_json(&client.blog_info(required(m, "BLOG")?).await?),
        Some(("avatar", m)) => avatar(&client, m).await,
        Some(("likes", m)) => likes(&client, required(m, "BLOG")?, params, m.is_present("all")).await,
        Some(("followers", m)) => {
            print_json(&client.blog_followers(required(m, "BLOG")?, &params).await?)
        }
        Some(("posts", m)) => print_json(&client.blog_posts(required(m, "BLOG")?, &params).await?),
        Some(("queue", m)) => {
            print_json(&client.blog_queued_posts(required(m, "BLOG")?, &params).await?)
        }
        Some(("drafts", m)) => print_json(&client.blog_drafts(required(m, "BLOG")?, &params).await?),
        Some(("submissions", m)) => {
            print_json(&client.blog_submissions(required(m, "BLOG")?, &params).await?)
        }
        Some(("post", m)) => {
            let mut params = params;
            for field in ["type", "state", "title", "body", "tags"] {
                if let Some(value) = m.value_of(field) {
                    params.insert(field, value);
                }
            }
            print_json(&client.post(required(m, "BLOG")?, &params).await?)
        }
        Some(("edit", m)) => {
            print_json(&client.post_edit(required(m, "BLOG")?, post_id(m)?, &params).await?)
        }
        Some(("reblog", m)) => print_json(
            &client
                .post_reblog(required(m, "BLOG")?, post_id(m)?, required(m, "REBLOG_KEY")?, &params)
                .await?,
        ),
        Some(("delete", m)) => {
            print_json(&client.post_delete(required(m, "BLOG")?, post_id(m)?).await?)
        }
        Some(("user", _)) => print_json(&client.user_info().await?),
        Some(("dashboard", _)) => print_json(&client.user_dashboard(&params).await?),
        Some(("user-likes", _)) => print_json(&client.user_likes(&params).await?),
        Some(("following", _)) => print_json(&client.user_following(&params).await?),
        Some(("follow", m)) => print_json(&client.user_follow(required(m, "BLOG")?).await?),
        Some(("unfollow", m)) => print_json(&client.user_unfollow(required(m, "BLOG")?).await?),
        Some(("like", m)) => {
            print_json(&client.user_like(post_id(m)?, required(m, "REBLOG_KEY")?).await?)
        }
        Some(("unlike", m)) => {
            print_json(&client.user_unlike(post_id(m)?, required(m, "REBLOG_KEY")?).await?)
        }
        Some(("tagged", m)) => print_json(&client.tagged_posts(required(m, "TAG")?, &params).await?),
        _ => Err(CliError::BadArgument("Unknown command".to_string())),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let default_filter = if matches.is_present("verbose") {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(&matches).await {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
