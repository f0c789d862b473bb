//! Progressive markdown viewer.
//!
//! ```text
//! cargo run -p mdreveal --example reveal --features crossterm -- [FILE.md] [--auto]
//! MDREVEAL_LOG=mdreveal=trace cargo run -p mdreveal --example reveal --features crossterm
//! ```
//!
//! Without a file a long generated document is shown. Logs go to `mdreveal.log`.

use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use mdreveal::ProgressiveMarkdownView;
use mdreveal::ProgressiveOptions;
use mdreveal::core::crossterm_input::input_event_from_crossterm;
use mdreveal::core::theme::Theme;
use mdreveal::markdown::render::MarkdownRenderOptions;
use mdreveal::markdown::render::MarkdownRenderer;
use mdreveal::view::should_reveal_progressively;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);

fn sample_document() -> String {
    let mut s = String::from("# mdreveal\n\nA long document, revealed as you scroll.\n\n");
    for i in 1..=60 {
        s.push_str(&format!("## Section {i}\n\n"));
        for _ in 0..6 {
            s.push_str("The quick brown fox jumps over the lazy dog. ");
        }
        s.push_str("\n\n- first point\n- second point with `inline code`\n\n");
        s.push_str("```rust\nfn section() -> usize {\n");
        s.push_str(&format!("    {i}\n}}\n```\n\n"));
        s.push_str("> Quoted text keeps its bar across wrapped lines.\n\n");
    }
    s
}

fn init_logging() -> io::Result<()> {
    let Ok(filter) = EnvFilter::try_from_env("MDREVEAL_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::create("mdreveal.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    init_logging()?;

    let mut auto = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--auto" {
            auto = true;
        } else {
            path = Some(arg);
        }
    }
    let content = match path {
        Some(p) => std::fs::read_to_string(p)?,
        None => sample_document(),
    };

    let options = ProgressiveOptions {
        auto_load_all: auto,
        padding_left: 1,
        padding_right: 1,
        ..ProgressiveOptions::default()
    };
    let mut view = if should_reveal_progressively(&content) {
        ProgressiveMarkdownView::with_options(ProgressiveOptions {
            chunk: mdreveal::markdown::ChunkOptions::with_chunk_size(2000),
            ..options
        })
    } else {
        ProgressiveMarkdownView::with_options(options)
    };
    view.set_renderer(Box::new(MarkdownRenderer::with_options(
        MarkdownRenderOptions {
            show_link_destinations: true,
            ..MarkdownRenderOptions::default()
        },
    )));
    let complete = Arc::new(AtomicBool::new(false));
    let flag = complete.clone();
    view.set_on_render_complete(move || flag.store(true, Ordering::SeqCst));
    view.set_content(&content);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run(&mut terminal, &mut view, &complete);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    view: &mut ProgressiveMarkdownView,
    complete: &AtomicBool,
) -> io::Result<()> {
    let theme = Theme::default();
    let title = format!(" {} ", view.title());
    let help = format!(
        " q quit  j/k scroll  {}",
        view.options().reveal.help_line()
    );

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(f.area());

            let block = Block::default()
                .borders(Borders::ALL)
                .title(title.as_str());
            let inner = block.inner(chunks[0]);
            f.render_widget(block, chunks[0]);
            view.render_ref(inner, f.buffer_mut(), &theme);

            let state = view.disclosure();
            let pct = view
                .state
                .percent_y()
                .map(|p| format!("  {p}%"))
                .unwrap_or_default();
            let status = if complete.load(Ordering::SeqCst) {
                format!("{help}  | all {} segments{pct}", state.total)
            } else {
                format!(
                    "{help}  | {}/{} segments{}{pct}",
                    state.visible_count,
                    state.total,
                    if state.is_loading { " (loading)" } else { "" }
                )
            };
            f.render_widget(Paragraph::new(Line::from(status).dark_gray()), chunks[1]);
        })?;

        let deadline = Instant::now() + FRAME;
        while crossterm::event::poll(deadline.saturating_duration_since(Instant::now()))? {
            let ev = crossterm::event::read()?;
            if let Event::Key(key) = &ev {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    view.unmount();
                    return Ok(());
                }
            }
            if let Some(ev) = input_event_from_crossterm(ev) {
                view.handle_event(ev);
            }
        }
        view.tick(Instant::now());
    }
}
