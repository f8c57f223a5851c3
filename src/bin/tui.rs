use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use heap_lob::{Engine, Execution, Order, OutputEvent, Price, Side, PRICE_SCALE};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const CAPACITY: usize = 200_000;
const LEVELS: usize = 15;
const RECENT_TRADES: usize = 12;
const BATCH_SIZE: u64 = 1000;

/// Top of book and latest trades, published by the engine thread
#[derive(Default, Clone)]
struct Snapshot {
    bids: Vec<(Price, u64)>,
    asks: Vec<(Price, u64)>,
    trades: VecDeque<Execution>,
}

#[derive(Default)]
struct Telemetry {
    orders: AtomicU64,
    batch_ns_per_order: AtomicU64,
    resting: AtomicU64,
    executions: AtomicU64,
    snapshot: RwLock<Snapshot>,
}

/// Random limit orders scattered around a drifting mid price.
///
/// Buys are skewed up and sells down by one dollar so that roughly a
/// quarter of the flow crosses.
struct SyntheticFlow {
    state: u64,
    seq: u64,
    mid: u64,
    epoch: DateTime<Utc>,
}

impl SyntheticFlow {
    const TICK: u64 = PRICE_SCALE / 100;

    fn new(seed: u64) -> Self {
        Self {
            state: seed,
            seq: 0,
            mid: 3_000 * PRICE_SCALE,
            epoch: Utc::now(),
        }
    }

    /// 64-bit LCG; callers use the high half
    fn next_random(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 32
    }

    fn next_order(&mut self) -> Order {
        self.seq += 1;
        let r = self.next_random();

        if r % 100 == 0 {
            let drift = (r % 11) as i64 - 5;
            self.mid = (self.mid as i64 + drift * Self::TICK as i64).max(PRICE_SCALE as i64) as u64;
        }

        let side = if r & 1 == 0 { Side::Buy } else { Side::Sell };
        let spread = (r % 200) * Self::TICK;
        let skew = 100 * Self::TICK;
        let ticks = match side {
            Side::Buy => (self.mid + skew).saturating_sub(spread),
            Side::Sell => (self.mid + spread).saturating_sub(skew),
        };
        let qty = 1 + (self.next_random() % 100) as u32;

        Order::new(
            format!("{}{}", if side == Side::Buy { 'B' } else { 'S' }, self.seq),
            side,
            Price::from_ticks(ticks.max(Self::TICK)),
            qty,
            self.epoch + ChronoDuration::microseconds(self.seq as i64),
        )
    }
}

fn run_engine(telemetry: Arc<Telemetry>) {
    let mut engine = Engine::new(CAPACITY);
    engine.warm_up();

    let mut flow = SyntheticFlow::new(12345);
    let mut recent: VecDeque<Execution> = VecDeque::with_capacity(RECENT_TRADES);

    for batch in 1u64.. {
        let started = Instant::now();

        for _ in 0..BATCH_SIZE {
            for event in engine.process(flow.next_order()) {
                if let OutputEvent::Trade(execution) = event {
                    if recent.len() == RECENT_TRADES {
                        recent.pop_front();
                    }
                    recent.push_back(execution);
                }
            }
        }

        telemetry.orders.fetch_add(BATCH_SIZE, Ordering::Relaxed);
        telemetry
            .batch_ns_per_order
            .store(started.elapsed().as_nanos() as u64 / BATCH_SIZE, Ordering::Relaxed);
        telemetry.resting.store(engine.order_count() as u64, Ordering::Relaxed);
        telemetry
            .executions
            .store(engine.matcher.execution_count(), Ordering::Relaxed);

        if batch % 50 == 0 {
            if let Ok(mut snapshot) = telemetry.snapshot.write() {
                snapshot.bids = engine.matcher.book(Side::Buy).depth(LEVELS);
                snapshot.asks = engine.matcher.book(Side::Sell).depth(LEVELS);
                snapshot.trades = recent.clone();
            }
        }

        // Nothing is ever cancelled; start over before the books grow unbounded
        if engine.order_count() > CAPACITY * 9 / 10 {
            engine = Engine::new(CAPACITY);
        }
    }
}

fn level_bars(levels: &[(Price, u64)]) -> String {
    let widest = levels.iter().map(|(_, q)| *q).max().unwrap_or(1) as f32;

    levels
        .iter()
        .map(|(price, qty)| {
            let bar = "█".repeat(((*qty as f32 / widest) * 20.0) as usize);
            format!("{price:>10.2} {bar:<20} {qty:<6}\n")
        })
        .collect()
}

fn trade_lines(trades: &VecDeque<Execution>) -> String {
    trades
        .iter()
        .rev()
        .map(|e| {
            format!(
                "#{:<8} {:>6} @ {:>10.2}  buy {:<10} sell {:<10}\n",
                e.execution_id, e.qty, e.price, e.buy_order_id, e.sell_order_id
            )
        })
        .collect()
}

fn draw(f: &mut Frame, snapshot: &Snapshot, telemetry: &Telemetry, orders_per_sec: f64) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(RECENT_TRADES as u16 + 2),
            Constraint::Length(6),
        ])
        .split(f.size());

    f.render_widget(
        Paragraph::new("Price-time priority | q to quit")
            .block(Block::default().borders(Borders::ALL).title("heap-lob"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan)),
        rows[0],
    );

    let books = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    for (area, title, levels, color) in [
        (books[0], "BUY BOOK", &snapshot.bids, Color::Green),
        (books[1], "SELL BOOK", &snapshot.asks, Color::Red),
    ] {
        f.render_widget(
            Paragraph::new(level_bars(levels)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .style(Style::default().fg(color)),
            ),
            area,
        );
    }

    f.render_widget(
        Paragraph::new(trade_lines(&snapshot.trades))
            .block(Block::default().borders(Borders::ALL).title("Recent Executions")),
        rows[2],
    );

    let rate = if orders_per_sec >= 1_000_000.0 {
        format!("{:.2} M", orders_per_sec / 1_000_000.0)
    } else {
        format!("{:.0} k", orders_per_sec / 1_000.0)
    };
    let text = format!(
        "Orders: {rate} /sec\nBatch latency: {} ns/order\nResting: {}\nExecutions: {}",
        telemetry.batch_ns_per_order.load(Ordering::Relaxed),
        telemetry.resting.load(Ordering::Relaxed),
        telemetry.executions.load(Ordering::Relaxed),
    );
    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Engine"))
            .style(Style::default().fg(Color::Yellow)),
        rows[3],
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The terminal belongs to the UI, so logs go to a file
    let log_file = std::fs::File::create("tui-demo.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    tracing::info!(capacity = CAPACITY, "starting synthetic order flow");

    let telemetry = Arc::new(Telemetry::default());
    {
        let telemetry = Arc::clone(&telemetry);
        thread::spawn(move || run_engine(telemetry));
    }

    enable_raw_mode()?;
    execute!(std::io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

    let mut window_start = Instant::now();
    let mut window_orders = 0u64;
    let mut orders_per_sec = 0.0;

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') {
                    break;
                }
            }
        }

        if window_start.elapsed() >= Duration::from_secs(1) {
            let total = telemetry.orders.load(Ordering::Relaxed);
            orders_per_sec = (total - window_orders) as f64 / window_start.elapsed().as_secs_f64();
            window_orders = total;
            window_start = Instant::now();
        }

        let snapshot = match telemetry.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        terminal.draw(|f| draw(f, &snapshot, &telemetry, orders_per_sec))?;
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}
