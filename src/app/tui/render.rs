use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Gauge, Padding, Paragraph, Row, Table, TableState, Wrap,
};

use super::super::episode::{format_duration, format_header_date, truncate};
use super::super::player::PlayerView;
use super::CatalogState;

const LATEST_MARKED: usize = 2;

pub(super) fn draw_tui(
    frame: &mut Frame,
    catalog: &CatalogState,
    table_state: &mut TableState,
    view: &PlayerView,
    status: &str,
    today: NaiveDate,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "PODCASTR",
            Style::default()
                .fg(Color::Rgb(160, 120, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            "O melhor para você ouvir sempre",
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(format_header_date(today), Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Podcastr"));
    frame.render_widget(header, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    draw_library(frame, body_chunks[0], catalog, table_state, view);
    draw_player(frame, body_chunks[1], view);

    let controls = Paragraph::new(controls_line(view))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);
}

fn draw_library(
    frame: &mut Frame,
    area: Rect,
    catalog: &CatalogState,
    table_state: &mut TableState,
    view: &PlayerView,
) {
    let placeholder = match catalog {
        CatalogState::Loading => Some("Carregando episódios...".to_string()),
        CatalogState::Failed(err) => Some(format!(
            "Não foi possível carregar os episódios.\n\n{}\n\nPress r to retry.",
            truncate(err, 120)
        )),
        CatalogState::Ready(episodes) if episodes.is_empty() => {
            Some("Nenhum episódio publicado ainda.".to_string())
        }
        CatalogState::Ready(_) => None,
    };
    if let Some(text) = placeholder {
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::Rgb(185, 195, 210)))
            .wrap(Wrap { trim: true })
            .block(panel_block("Episódios"));
        frame.render_widget(paragraph, area);
        return;
    }

    let current_id = view.episode.as_ref().map(|episode| episode.id.as_str());
    let rows: Vec<Row> = catalog
        .episodes()
        .iter()
        .enumerate()
        .map(|(idx, episode)| {
            let marker = if current_id == Some(episode.id.as_str()) {
                "♪"
            } else if idx < LATEST_MARKED {
                "★"
            } else {
                " "
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(episode.title.clone()),
                Cell::from(episode.members.clone()),
                Cell::from(episode.published_at.clone()),
                Cell::from(episode.duration_label.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Percentage(48),
            Constraint::Percentage(26),
            Constraint::Length(10),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec!["", "Podcast", "Integrantes", "Data", "Duração"]).style(
            Style::default()
                .fg(Color::Rgb(160, 120, 255))
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(panel_block("Episódios"))
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(160, 120, 255))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, table_state);
}

fn draw_player(frame: &mut Frame, area: Rect, view: &PlayerView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    let text = match &view.episode {
        Some(episode) => {
            let position = view
                .current_index
                .map(|idx| format!("{} de {}", idx + 1, view.playlist_len))
                .unwrap_or_default();
            format!(
                "{}\n\n{}\n\nEpisódio {}{}",
                truncate(&episode.title, 60),
                truncate(&episode.members, 60),
                position,
                if view.is_playing { "" } else { "  (pausado)" },
            )
        }
        None => "Selecione um podcast para ouvir".to_string(),
    };
    let now_playing = Paragraph::new(text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(panel_block("Tocando agora").padding(Padding::new(1, 1, 1, 0)));
    frame.render_widget(now_playing, chunks[0]);

    let (ratio, label) = progress_ratio_and_label(view);
    let progress = Gauge::default()
        .block(panel_block("Progresso"))
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(4, 211, 97))
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .label(label)
        .ratio(ratio);
    frame.render_widget(progress, chunks[1]);
}

fn progress_ratio_and_label(view: &PlayerView) -> (f64, String) {
    if view.episode.is_none() {
        return (0.0, "00:00:00 / 00:00:00".to_string());
    }
    let ratio = if view.duration_seconds == 0 {
        0.0
    } else {
        (view.progress_seconds as f64 / view.duration_seconds as f64).clamp(0.0, 1.0)
    };
    let label = format!(
        "{} / {}",
        format_duration(view.progress_seconds),
        format_duration(view.duration_seconds)
    );
    (ratio, label)
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn pill_active() -> Style {
    Style::default()
        .bg(Color::Rgb(160, 120, 255))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default()
        .bg(Color::Rgb(72, 82, 96))
        .fg(Color::Rgb(230, 235, 242))
}

fn pill_disabled() -> Style {
    Style::default()
        .bg(Color::Rgb(36, 40, 48))
        .fg(Color::Rgb(100, 108, 120))
}

fn pill_style(enabled: bool, active: bool) -> Style {
    match (enabled, active) {
        (false, _) => pill_disabled(),
        (true, true) => pill_active(),
        (true, false) => pill_inactive(),
    }
}

fn controls_line(view: &PlayerView) -> Line<'static> {
    let has_episode = view.episode.is_some();
    let play_label = if view.is_playing { " ❚❚ PAUSE " } else { " ▶ PLAY " };
    Line::from(vec![
        Span::styled(
            " SHUFFLE ",
            pill_style(has_episode && view.playlist_len > 1, view.is_shuffling),
        ),
        Span::styled(" ", Style::default()),
        Span::styled(" ◀◀ PREV ", pill_style(view.has_previous, false)),
        Span::styled(" ", Style::default()),
        Span::styled(play_label, pill_style(has_episode, view.is_playing)),
        Span::styled(" ", Style::default()),
        Span::styled(" NEXT ▶▶ ", pill_style(view.has_next, false)),
        Span::styled(" ", Style::default()),
        Span::styled(" LOOP ", pill_style(has_episode, view.is_looping)),
        Span::styled(
            "   ↑/↓ move  Enter play  space pause  n/p skip  s/l modes  ←/→ seek  r reload  q quit",
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
    ])
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::player::testing::episode;

    fn idle_view() -> PlayerView {
        PlayerView {
            episode: None,
            current_index: None,
            playlist_len: 0,
            is_playing: false,
            is_looping: false,
            is_shuffling: false,
            has_next: false,
            has_previous: false,
            progress_seconds: 0,
            duration_seconds: 0,
        }
    }

    #[test]
    fn progress_label_shows_elapsed_and_total() {
        let view = PlayerView {
            episode: Some(episode("a", 3_600)),
            current_index: Some(0),
            playlist_len: 1,
            is_playing: true,
            progress_seconds: 900,
            duration_seconds: 3_600,
            ..idle_view()
        };

        let (ratio, label) = progress_ratio_and_label(&view);

        assert!((ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(label, "00:15:00 / 01:00:00");
    }

    #[test]
    fn progress_handles_unknown_duration() {
        let view = PlayerView {
            episode: Some(episode("a", 0)),
            current_index: Some(0),
            playlist_len: 1,
            progress_seconds: 42,
            ..idle_view()
        };

        let (ratio, label) = progress_ratio_and_label(&view);

        assert_eq!(ratio, 0.0);
        assert_eq!(label, "00:00:42 / 00:00:00");
    }

    #[test]
    fn idle_controls_are_disabled() {
        let line = controls_line(&idle_view());
        assert!(line.spans.iter().any(|span| span.content.contains("PLAY")));
        assert!(
            line.spans
                .iter()
                .filter(|span| span.content.trim() == "SHUFFLE" || span.content.trim() == "LOOP")
                .all(|span| span.style == pill_disabled())
        );
    }

    #[test]
    fn status_style_highlights_errors() {
        assert_eq!(
            status_style("ERROR: boom").fg,
            Some(Color::Rgb(255, 145, 120))
        );
        assert_eq!(status_style("INFO: ok").fg, Some(Color::Rgb(205, 165, 255)));
    }
}
