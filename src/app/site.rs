use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use super::episode::{Episode, format_header_date, is_safe_slug};

const LATEST_COUNT: usize = 2;
const TAGLINE: &str = "O melhor para você ouvir sempre";

const STYLESHEET: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #f7f8fa; color: #494d4b; font: 500 15px Inter, sans-serif; }
a { color: inherit; }
.header { display: flex; align-items: center; gap: 2rem; height: 6.5rem; padding: 2rem 4rem; background: #fff; border-bottom: 1px solid #e6e8eb; }
.header strong { color: #8257e5; font-size: 1.5rem; }
.header p { padding-left: 2rem; border-left: 1px solid #e6e8eb; }
.header span { margin-left: auto; text-transform: capitalize; }
main { padding: 0 4rem; }
h2 { margin: 3rem 0 1.5rem; color: #494d4b; }
.latest ul { list-style: none; display: grid; grid-template-columns: repeat(2, 1fr); gap: 1.5rem; }
.latest li { display: flex; align-items: center; gap: 1rem; padding: 1.25rem; background: #fff; border: 1px solid #f7f8fa; border-radius: 1.5rem; }
.latest img { width: 6rem; height: 6rem; object-fit: cover; border-radius: 1rem; }
.details span { display: inline-block; margin-top: 0.5rem; font-size: 0.875rem; }
table { width: 100%; border-collapse: collapse; margin-bottom: 3rem; }
th, td { padding: 0.75rem 1rem; border-bottom: 1px solid #e6e8eb; text-align: left; }
th { color: #808080; text-transform: uppercase; font-size: 0.75rem; }
td img { width: 2.5rem; height: 2.5rem; object-fit: cover; border-radius: 0.5rem; }
.episode { max-width: 45rem; margin: 0 auto; padding: 3rem 2rem; }
.episode .thumbnail { width: 100%; height: 10.5rem; object-fit: cover; border-radius: 1rem; }
.episode header { padding-bottom: 1rem; border-bottom: 1px solid #e6e8eb; }
.episode h1 { margin: 2rem 0 1.5rem; color: #494d4b; }
.episode header span { display: inline-block; margin-right: 1rem; }
.episode audio { width: 100%; margin: 1.5rem 0; }
.description { line-height: 1.675rem; }
.description p { margin: 1.5rem 0; }
"#;

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, stylesheet_href: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n<link rel=\"stylesheet\" href=\"{stylesheet_href}\">\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        html_escape(title)
    )
}

fn header_html(home_href: &str, today: NaiveDate) -> String {
    format!(
        "<header class=\"header\">\n<a href=\"{home_href}\"><strong>Podcastr</strong></a>\n<p>{TAGLINE}</p>\n<span>{}</span>\n</header>",
        html_escape(&format_header_date(today))
    )
}

fn episode_href(prefix: &str, episode: &Episode) -> String {
    format!("{prefix}episodes/{}.html", episode.id)
}

/// Home page: the newest episodes as cards, the rest in a table.
pub(crate) fn render_home(episodes: &[Episode], today: NaiveDate) -> String {
    let linkable: Vec<&Episode> = episodes.iter().filter(|ep| is_safe_slug(&ep.id)).collect();
    let split = LATEST_COUNT.min(linkable.len());
    let (latest, rest) = linkable.split_at(split);

    let latest_items: String = latest
        .iter()
        .map(|episode| {
            format!(
                "<li>\n<img src=\"{thumb}\" alt=\"{title}\">\n<div class=\"details\">\n<a href=\"{href}\">{title}</a>\n<p>{members}</p>\n<span>{date}</span>\n<span>{duration}</span>\n</div>\n<a class=\"play\" href=\"{href}#player\" title=\"Tocar episódio\">&#9654;</a>\n</li>\n",
                thumb = html_escape(&episode.thumbnail),
                title = html_escape(&episode.title),
                href = html_escape(&episode_href("", episode)),
                members = html_escape(&episode.members),
                date = html_escape(&episode.published_at),
                duration = html_escape(&episode.duration_label),
            )
        })
        .collect();

    let rest_rows: String = rest
        .iter()
        .map(|episode| {
            format!(
                "<tr>\n<td><img src=\"{thumb}\" alt=\"{title}\"></td>\n<td><a href=\"{href}\">{title}</a></td>\n<td>{members}</td>\n<td>{date}</td>\n<td>{duration}</td>\n</tr>\n",
                thumb = html_escape(&episode.thumbnail),
                title = html_escape(&episode.title),
                href = html_escape(&episode_href("", episode)),
                members = html_escape(&episode.members),
                date = html_escape(&episode.published_at),
                duration = html_escape(&episode.duration_label),
            )
        })
        .collect();

    let body = format!(
        "{header}\n<main>\n<section class=\"latest\">\n<h2>Últimos lançamentos</h2>\n<ul>\n{latest_items}</ul>\n</section>\n<section class=\"all\">\n<h2>Todos episódios</h2>\n<table>\n<thead><tr><th></th><th>Podcast</th><th>Integrantes</th><th>Data</th><th>Duração</th></tr></thead>\n<tbody>\n{rest_rows}</tbody>\n</table>\n</section>\n</main>",
        header = header_html("index.html", today),
    );
    page("Home | Podcastr", "styles.css", &body)
}

/// Episode page; the description is publisher HTML and is embedded as-is.
pub(crate) fn render_episode(episode: &Episode, today: NaiveDate) -> String {
    let body = format!(
        "{header}\n<div class=\"episode\">\n<a href=\"../index.html\" title=\"Voltar\">&larr; Voltar</a>\n<img class=\"thumbnail\" src=\"{thumb}\" alt=\"{title}\">\n<header>\n<h1>{title}</h1>\n<span>{members}</span>\n<span>{date}</span>\n<span>{duration}</span>\n</header>\n<audio id=\"player\" controls preload=\"none\" src=\"{media}\"></audio>\n<div class=\"description\">{description}</div>\n</div>",
        header = header_html("../index.html", today),
        thumb = html_escape(&episode.thumbnail),
        title = html_escape(&episode.title),
        members = html_escape(&episode.members),
        date = html_escape(&episode.published_at),
        duration = html_escape(&episode.duration_label),
        media = html_escape(&episode.media_url),
        description = episode.description,
    );
    page(&format!("{} | Podcastr", episode.title), "../styles.css", &body)
}

/// Writes `index.html`, `styles.css` and `episodes/<id>.html`; returns the paths written.
pub(crate) fn write_site(out_dir: &Path, episodes: &[Episode], today: NaiveDate) -> Result<Vec<PathBuf>> {
    let episodes_dir = out_dir.join("episodes");
    fs::create_dir_all(&episodes_dir)
        .with_context(|| format!("failed to create output directory {}", episodes_dir.display()))?;

    let mut written = Vec::new();
    let mut write = |path: PathBuf, contents: &str| -> Result<()> {
        fs::write(&path, contents).with_context(|| format!("failed writing {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    write(out_dir.join("index.html"), &render_home(episodes, today))?;
    write(out_dir.join("styles.css"), STYLESHEET.trim_start())?;

    for episode in episodes {
        if !is_safe_slug(&episode.id) {
            warn!(id = %episode.id, "skipping episode page with unsafe id");
            continue;
        }
        let path = episodes_dir.join(format!("{}.html", episode.id));
        write(path, &render_episode(episode, today))?;
    }

    info!(dir = %out_dir.display(), files = written.len(), "site written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_covers_markup_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }
}
