//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::asm::disasm::disassemble_byte;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: boards, signals and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_boards(frame, left_chunks[0], app);
    draw_signals(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(18),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// One labelled byte: decimal, hex and binary.
fn byte_line(label: &str, value: u8) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<5}", label), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{:>3}", value), Style::default().fg(Color::White)),
        Span::raw(format!("  ${:02x}  {:08b}", value, value)),
    ])
}

/// Draw every board plus the bus.
fn draw_boards(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;
    let flags = cpu.flags();
    let pending = cpu.alu.pending();

    let clk_style = if cpu.clock.level() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let content = vec![
        Line::from(vec![
            Span::raw("CLK  "),
            Span::styled(if cpu.clock.level() { "HIGH" } else { "low " }, clk_style),
            Span::raw(format!("   step {}   ticks {}", cpu.micro_step(), cpu.ticks)),
        ]),
        byte_line("BUS", cpu.bus_value()),
        byte_line("A", cpu.a.value()),
        byte_line("B", cpu.b.value()),
        Line::from(vec![
            Span::styled(format!("{:<5}", "ALU"), Style::default().fg(Color::Cyan)),
            Span::styled(format!("{:>3}", cpu.alu.result()), Style::default().fg(Color::White)),
            Span::raw(format!("  flags {}  pending {}", flags, pending)),
        ]),
        byte_line("PC", cpu.pc.value()),
        byte_line("MAR", cpu.mar.value()),
        Line::from(vec![
            Span::styled(format!("{:<5}", "IR"), Style::default().fg(Color::Cyan)),
            Span::styled(format!("${:02x}", cpu.ir.value()), Style::default().fg(Color::White)),
            Span::raw(format!("  {}", disassemble_byte(cpu.ir.value()))),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<5}", "OUT"), Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:>3}", cpu.output()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("State: "),
            if cpu.is_halted() {
                Span::styled("HALTED", Style::default().fg(Color::Red))
            } else if app.running {
                Span::styled("running", Style::default().fg(Color::Green))
            } else {
                Span::styled("stopped", Style::default().fg(Color::White))
            },
            if cpu.executing_undefined() {
                Span::styled("  (undefined opcode)", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("")
            },
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Boards ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the control lines asserted for this tick.
fn draw_signals(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let signals = app.cpu.control.signals();
    let style = if signals.drivers() > 1 {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let paragraph = Paragraph::new(signals.to_string())
        .style(style)
        .block(Block::default()
            .title(" Signals ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .memory_view()
        .into_iter()
        .map(|row| {
            let prefix = if row.is_pc { "▶" } else { " " };
            let bp = if app.breakpoints.contains(&row.addr) { "●" } else { " " };
            let mar = if row.is_mar { "M" } else { " " };
            let text = format!(
                "{}{}{} {:02}: ${:02x}  {}",
                bp, prefix, mar, row.addr, row.value, row.text
            );

            let style = if row.is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if row.is_mar {
                Style::default().fg(Color::Cyan)
            } else if app.breakpoints.contains(&row.addr) {
                Style::default().fg(Color::Red)
            } else if row.value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("t: Tick  s: Step  i: Instr  r: Run  p: Pause"),
        Line::from("b: Breakpoint  x: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
