use anyhow::{anyhow, bail, Result};
use chrono::Local;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use voices::config::Config;
use voices::document::{Document, Location};
use voices::feed::{write_feed, FeedConfig};
use voices::post::{source_files, welcome_post, Parser, PostId};
use voices::render::Lookup;
use voices::storage::FileStorage;
use voices::store::PostStore;
use voices::util::output;
use voices::write::{parse_template, write_document};

type Store = PostStore<FileStorage>;

fn main() -> Result<()> {
    let matches = app().get_matches();
    tracing_subscriber::fmt()
        .with_max_level(match matches.is_present("verbose") {
            true => Level::DEBUG,
            false => Level::INFO,
        })
        .with_writer(std::io::stderr)
        .init();

    let project = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let config = Config::from_directory(&project)?;

    // Every command sees an initialized store, just like every page load.
    let mut store = PostStore::new(
        FileStorage::new(&config.storage_file),
        config.storage_key.as_str(),
    );
    store.initialize(welcome_post(&config.site_name, &Local::now()))?;

    match matches.subcommand() {
        ("init", _) => Ok(()),
        ("list", _) => list(&store),
        ("feed", Some(m)) => feed_page(&config, &store, m),
        ("post", Some(m)) => post_page(&config, &store, m),
        ("publish", Some(m)) => publish(&mut store, m),
        ("remove", Some(m)) => remove(&mut store, m),
        ("atom", Some(m)) => atom(&config, &store, m),
        (name, _) => Err(anyhow!("Unknown command `{}`", name)),
    }
}

fn app() -> App<'static, 'static> {
    let output = || {
        Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .help("The file to write to (defaults to standard output)")
    };
    App::new("voices")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .help("The directory to search for `voices.yaml` (defaults to the current directory)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log debug output"),
        )
        .subcommand(SubCommand::with_name("init").about("Seeds the post store if it's empty"))
        .subcommand(SubCommand::with_name("list").about("Lists posts, newest first"))
        .subcommand(
            SubCommand::with_name("feed")
                .about("Renders the feed page")
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("post")
                .about("Renders the post page for an address such as `post.html?id=42`")
                .arg(Arg::with_name("address").required(true))
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("publish")
                .about("Publishes a Markdown post, or every Markdown post in a directory")
                .arg(Arg::with_name("path").required(true)),
        )
        .subcommand(
            SubCommand::with_name("remove")
                .about("Removes a post")
                .arg(Arg::with_name("id").required(true)),
        )
        .subcommand(
            SubCommand::with_name("atom")
                .about("Writes an Atom feed of all posts")
                .arg(output()),
        )
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| anyhow!("Missing argument `{}`", name))
}

fn list(store: &Store) -> Result<()> {
    let mut posts = store.get_all()?;
    posts.sort_by(|a, b| b.id.cmp(&a.id));
    for post in posts {
        println!("{}\t{}\t{}", post.id, post.date, post.title);
    }
    Ok(())
}

fn feed_page(config: &Config, store: &Store, matches: &ArgMatches) -> Result<()> {
    let template = parse_template(config.index_template.iter())?;
    let mut document = Document::new(Location::parse(&config.site_root, "index.html")?)
        .with_elements(config.index_elements.iter().cloned());
    document.title = config.site_name.clone();
    config
        .renderer()
        .render_feed(&mut document, &store.get_all()?);
    write_document(
        &template,
        &document,
        &mut output(matches.value_of("output").map(Path::new))?,
    )?;
    Ok(())
}

fn post_page(config: &Config, store: &Store, matches: &ArgMatches) -> Result<()> {
    let template = parse_template(config.posts_template.iter())?;
    let location = Location::parse(&config.site_root, required(matches, "address")?)?;
    let mut document =
        Document::new(location.clone()).with_elements(config.posts_elements.iter().cloned());

    match config.renderer().render_post(&mut document, &store.get_all()?) {
        Lookup::Found(id) => info!(id = %id, "rendered post"),
        Lookup::NotFound => warn!(address = %location.url(), "post not found"),
    }
    if document.location != location {
        eprintln!("address: {}", document.location.url());
    }

    write_document(
        &template,
        &document,
        &mut output(matches.value_of("output").map(Path::new))?,
    )?;
    Ok(())
}

fn publish(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let now = Local::now();
    let parser = Parser::new(&now);
    let files = source_files(Path::new(required(matches, "path")?))?;
    if files.is_empty() {
        bail!("No Markdown posts found");
    }
    for file in files {
        let mut post = parser.parse_file(&file)?;
        post.id = store.next_id(post.id)?;
        println!("{}\t{}", post.id, post.title);
        store.insert(post)?;
    }
    Ok(())
}

fn remove(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let id: PostId = required(matches, "id")?
        .parse()
        .map_err(|e| anyhow!("Invalid post id: {}", e))?;
    if !store.remove(id)? {
        bail!("No post with id {}", id);
    }
    Ok(())
}

fn atom(config: &Config, store: &Store, matches: &ArgMatches) -> Result<()> {
    write_feed(
        FeedConfig {
            title: config.site_name.clone(),
            id: config.site_root.to_string(),
            author: config.author.clone(),
            site_root: config.site_root.clone(),
            summary_length: config.snippet_length,
        },
        &store.get_all()?,
        output(matches.value_of("output").map(Path::new))?,
    )
    .map_err(|e| anyhow!("Writing Atom feed: {}", e))
}
