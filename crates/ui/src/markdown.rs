//! Notes markdown to styled ratatui lines.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Palette;

const CODE_BG: Color = Color::Rgb(40, 44, 52);

pub(crate) fn markdown_to_lines(md: &str, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut styles: Vec<Style> = vec![Style::default().fg(palette.text)];
    let mut in_code_block = false;
    let mut list_stack: Vec<Option<u64>> = Vec::new();
    let mut quote_depth = 0usize;

    for event in Parser::new(md) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush(&mut spans, &mut lines);
                let style = match level {
                    HeadingLevel::H1 => Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    HeadingLevel::H2 => Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                    _ => Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
                };
                styles.push(style);
            }
            Event::End(TagEnd::Heading(_)) => {
                styles.pop();
                flush(&mut spans, &mut lines);
                lines.push(Line::raw(""));
            }

            Event::Start(Tag::Strong) => {
                let base = current(&styles);
                styles.push(base.add_modifier(Modifier::BOLD));
            }
            Event::Start(Tag::Emphasis) => {
                let base = current(&styles);
                styles.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::Start(Tag::Link { .. }) => {
                let base = current(&styles);
                styles.push(base.fg(palette.accent).add_modifier(Modifier::UNDERLINED));
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link) => {
                styles.pop();
            }

            Event::Code(code) => {
                spans.push(Span::styled(
                    format!(" {code} "),
                    Style::default().fg(palette.text).bg(CODE_BG),
                ));
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                flush(&mut spans, &mut lines);
                in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    lines.push(Line::styled(
                        format!("[{lang}]"),
                        Style::default().fg(palette.muted),
                    ));
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                lines.push(Line::raw(""));
            }

            Event::Start(Tag::List(start)) => {
                flush(&mut spans, &mut lines);
                list_stack.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
                if list_stack.is_empty() {
                    lines.push(Line::raw(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut spans, &mut lines);
                let indent = "  ".repeat(list_stack.len().saturating_sub(1));
                let marker = match list_stack.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                spans.push(Span::styled(marker, Style::default().fg(palette.accent)));
            }
            Event::End(TagEnd::Item) => flush(&mut spans, &mut lines),

            Event::Start(Tag::BlockQuote) => {
                flush(&mut spans, &mut lines);
                quote_depth += 1;
                let base = current(&styles);
                styles.push(base.fg(palette.muted).add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::BlockQuote) => {
                flush(&mut spans, &mut lines);
                quote_depth = quote_depth.saturating_sub(1);
                styles.pop();
            }

            Event::End(TagEnd::Paragraph) => {
                flush(&mut spans, &mut lines);
                if list_stack.is_empty() {
                    lines.push(Line::raw(""));
                }
            }

            Event::Text(text) => {
                if in_code_block {
                    for code_line in text.lines() {
                        lines.push(Line::styled(
                            format!("  {code_line}"),
                            Style::default().fg(palette.text).bg(CODE_BG),
                        ));
                    }
                } else {
                    if spans.is_empty() && quote_depth > 0 {
                        spans.push(Span::styled(
                            "│ ".repeat(quote_depth),
                            Style::default().fg(palette.muted),
                        ));
                    }
                    spans.push(Span::styled(text.to_string(), current(&styles)));
                }
            }
            Event::SoftBreak => spans.push(Span::raw(" ")),
            Event::HardBreak => flush(&mut spans, &mut lines),
            Event::Rule => {
                flush(&mut spans, &mut lines);
                lines.push(Line::styled("─".repeat(32), Style::default().fg(palette.muted)));
            }
            _ => {}
        }
    }

    flush(&mut spans, &mut lines);
    while lines.last().is_some_and(|line| line.width() == 0) {
        lines.pop();
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
pub(crate) fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| {
            let w: usize = line
                .spans
                .iter()
                .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
                .sum();
            w.div_ceil(width).max(1)
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn current(stack: &[Style]) -> Style {
    stack.last().copied().unwrap_or_default()
}

fn flush(spans: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}
