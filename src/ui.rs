use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode, SurfaceAreas};
use crate::messages::ChatRole;

const SEND_BUTTON_WIDTH: u16 = 10;
const MIN_INPUT_WIDTH: u16 = 8;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(len) = after_open.find("**") else {
            break;
        };
        if len == 0 {
            // "****" has nothing to embolden
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &rest[start + 4..];
            continue;
        }
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after_open[..len].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[len + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Lay out the surface. Elements that do not fit are left out.
pub fn layout(area: Rect) -> (Rect, SurfaceAreas, Rect) {
    let [header_area, messages_area, thinking_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let (input_area, send_area) = if input_row.width >= MIN_INPUT_WIDTH + SEND_BUTTON_WIDTH {
        let [input, send] = Layout::horizontal([
            Constraint::Min(MIN_INPUT_WIDTH),
            Constraint::Length(SEND_BUTTON_WIDTH),
        ])
        .areas(input_row);
        (Some(input), Some(send))
    } else {
        (Some(input_row), None)
    };

    let fits = |r: Rect, min_height: u16| (r.height >= min_height && r.width > 0).then_some(r);

    let areas = SurfaceAreas {
        // Borders take two rows, leave at least one for text
        messages: fits(messages_area, 3),
        thinking: fits(thinking_area, 1),
        input: input_area.and_then(|r| fits(r, 3)),
        send: send_area.and_then(|r| fits(r, 3)),
    };

    (header_area, areas, footer_area)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let (header_area, areas, footer_area) = layout(frame.area());
    app.areas = areas;

    render_header(app, frame, header_area);

    if let Some(area) = areas.messages {
        render_messages(app, frame, area);
    }
    if let Some(area) = areas.thinking {
        render_thinking(app, frame, area);
    }
    if let Some(area) = areas.input {
        render_input(app, frame, area);
    }
    if let Some(area) = areas.send {
        render_send_button(app, frame, area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let client_id: String = app.client.session().client_id.chars().take(8).collect();
    let header = Line::from(vec![
        Span::styled(" chatline ", Style::default().fg(Color::Black).bg(Color::Cyan).bold()),
        Span::raw(" "),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(format!("id {}", client_id), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Normal { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Messages ({}) ", app.client.messages().len()));

    let log = app.client.messages();
    let text = if log.is_empty() {
        Text::from(Span::styled(
            app.client.session().language.input_placeholder(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for row in log.rows() {
            let header_style = match row.role {
                ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            };
            lines.push(Line::from(Span::styled(
                format!("{} {}:", row.avatar, row.label),
                header_style,
            )));
            match row.role {
                ChatRole::User => {
                    for line in row.text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                ChatRole::Assistant => {
                    for line in row.text.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
            lines.push(Line::default());
        }
        Text::from(lines)
    };

    // Measure at the inner size, the same wrap the block will draw with
    let inner = block.inner(area);
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    let content_lines = if inner.width == 0 {
        0
    } else {
        paragraph.line_count(inner.width).min(u16::MAX as usize) as u16
    };
    app.update_scroll(content_lines, inner.height);

    let paragraph = paragraph.block(block).scroll((app.scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_thinking(app: &App, frame: &mut Frame, area: Rect) {
    if !app.client.state().is_thinking() {
        return;
    }
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((app.animation_frame as usize) + 1);
    let indicator = Paragraph::new(Span::styled(
        format!(" {} {}{}", ChatRole::Assistant.avatar(), app.client.session().language.thinking(), dots),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ));
    frame.render_widget(indicator, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.controls_enabled();
    let editing = enabled && app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    let inner_width = area.width.saturating_sub(2);
    let (visible_text, cursor_x) = visible_input(app.input(), app.cursor, inner_width);

    let input = if app.input().is_empty() && !editing {
        Paragraph::new(app.client.session().language.input_placeholder())
            .style(Style::default().fg(Color::DarkGray))
    } else {
        let style = if enabled { Style::default().fg(Color::Cyan) } else { Style::default().fg(Color::DarkGray) };
        Paragraph::new(visible_text).style(style)
    };

    frame.render_widget(input.block(block), area);

    if editing && inner_width > 0 {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Slice of `input` that fits in `width` columns with the char cursor in view,
/// and the cursor's screen column within that slice.
fn visible_input(input: &str, cursor: usize, width: u16) -> (String, u16) {
    let width = width as usize;
    if width == 0 {
        return (String::new(), 0);
    }
    let widths: Vec<usize> = input
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .collect();
    let cursor = cursor.min(widths.len());

    // Drop leading chars until the cursor cell itself fits
    let mut start = 0;
    let mut cursor_col: usize = widths[..cursor].iter().sum();
    while start < cursor && cursor_col >= width {
        cursor_col -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible: String = input
        .chars()
        .zip(widths.iter())
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, cursor_col.min(width - 1) as u16)
}

fn render_send_button(app: &App, frame: &mut Frame, area: Rect) {
    let style = if app.controls_enabled() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new("Send")
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(button, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let help = match app.input_mode {
        InputMode::Editing => " Enter send · Esc scroll mode · Ctrl+C quit ",
        InputMode::Normal => " j/k scroll · g/G top/bottom · i type · q quit ",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
        area,
    );
}
