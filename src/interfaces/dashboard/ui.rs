use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, Tabs, Wrap},
};

use super::{DashboardApp, TABS, Tab};
use crate::core::dashboard::stats::{self, TeamStats};
use crate::core::dashboard::{Agent, AgentStatus, AgentTask, TaskStatus};
use crate::core::turso::Row;

fn column_color(status: TaskStatus) -> Color {
    match status.column() {
        TaskStatus::Inbox => Color::Gray,
        TaskStatus::Assigned => Color::Yellow,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Review => Color::LightRed,
        TaskStatus::Done => Color::Green,
        _ => Color::LightYellow,
    }
}

fn agent_status_color(status: AgentStatus) -> Color {
    match status {
        AgentStatus::Working => Color::Green,
        AgentStatus::Idle => Color::DarkGray,
        AgentStatus::Waiting => Color::Yellow,
    }
}

fn bordered(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn dim(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

impl DashboardApp {
    pub(super) fn render(&self, f: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

        f.render_widget(self.render_header(), chunks[0]);
        f.render_widget(self.render_tabs(), chunks[1]);
        match self.tab {
            Tab::Overview => self.render_overview(f, chunks[2]),
            Tab::Board => self.render_board(f, chunks[2], &self.snapshot.agents),
            Tab::Agents => self.render_agents(f, chunks[2]),
            Tab::Runs => self.render_runs(f, chunks[2]),
            Tab::Memory => self.render_memory(f, chunks[2]),
            Tab::Usage => self.render_usage(f, chunks[2]),
            Tab::Activity => self.render_activity(f, chunks[2]),
        }
        f.render_widget(self.render_footer(), chunks[3]);
    }

    fn render_header(&self) -> Paragraph<'_> {
        let snapshot = &self.snapshot;
        let (badge, badge_color) = if snapshot.is_live {
            (" LIVE ", Color::Green)
        } else {
            (" STATIC ", Color::DarkGray)
        };

        let mut spans = vec![
            Span::styled(
                "🎯 Mission Control ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(badge, Style::default().fg(Color::Black).bg(badge_color)),
            Span::raw("  "),
        ];
        if snapshot.is_loading {
            spans.push(Span::styled("loading… ", Style::default().fg(Color::Yellow)));
        }
        if let Some(error) = &snapshot.error {
            spans.push(Span::styled(
                format!("⚠ {} ", error),
                Style::default().fg(Color::Red),
            ));
        }
        if let Some(updated) = snapshot.last_updated {
            spans.push(dim(format!("synced {}  ", updated.format("%H:%M:%S"))));
        }
        spans.push(dim(format!(
            "last refreshed {}  ",
            self.last_refreshed.format("%H:%M:%S")
        )));
        spans.push(Span::styled(
            format!(
                "[{}] Auto-refresh 30s",
                if self.auto_refresh { "x" } else { " " }
            ),
            Style::default().fg(if self.auto_refresh {
                Color::Cyan
            } else {
                Color::DarkGray
            }),
        ));

        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
    }

    fn render_tabs(&self) -> Tabs<'_> {
        let titles: Vec<Line> = TABS
            .iter()
            .enumerate()
            .map(|(i, (_, label))| Line::from(format!("{} {}", i + 1, label)))
            .collect();
        Tabs::new(titles)
            .select(self.tab.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
    }

    fn render_footer(&self) -> Paragraph<'_> {
        let mut hints = vec![
            ("←/→", "tabs"),
            ("r", "refresh"),
            ("a", "auto-refresh"),
            ("↑/↓", "scroll"),
        ];
        if self.tab == Tab::Agents {
            hints[3] = ("↑/↓", "agent");
            hints.push(("f", "filter"));
        }
        hints.push(("q", "quit"));

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(k, label)| {
                [
                    Span::styled(format!(" {} ", k), Style::default().fg(Color::Cyan)),
                    dim(format!("{}  ", label)),
                ]
            })
            .collect();
        Paragraph::new(Line::from(spans))
    }

    fn render_overview(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([Constraint::Length(4), Constraint::Min(3)]).split(area);
        let stats = TeamStats::from_agents(&self.snapshot.agents);
        let cards = [
            (stats.total_agents, "Total Agents"),
            (stats.active, "Active"),
            (stats.completed, "Completed"),
            (stats.in_progress, "In Progress"),
            (stats.queued, "Open Tasks"),
        ];
        let cells = Layout::horizontal([Constraint::Ratio(1, 5); 5]).split(chunks[0]);
        for ((value, label), cell) in cards.iter().zip(cells.iter()) {
            let card = Paragraph::new(vec![
                Line::from(Span::styled(
                    value.to_string(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
                Line::from(dim(*label)),
            ])
            .centered()
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
            f.render_widget(card, *cell);
        }
        self.render_board(f, chunks[1], &self.snapshot.agents);
    }

    fn owner_label(&self, task: &AgentTask) -> String {
        self.snapshot
            .agents
            .iter()
            .find(|a| a.id == task.agent_id)
            .map(|a| format!("{} {}", a.emoji, a.name))
            .unwrap_or_else(|| "unassigned".to_string())
    }

    fn render_board(&self, f: &mut Frame, area: Rect, agents: &[Agent]) {
        let board = stats::board(agents);
        let columns = Layout::horizontal([Constraint::Ratio(1, 6); 6]).split(area);
        for ((column, tasks), rect) in board.iter().zip(columns.iter()) {
            let color = column_color(column.id);
            let mut lines = Vec::new();
            for task in tasks {
                lines.push(Line::from(Span::styled(
                    task.title.clone(),
                    Style::default().fg(Color::White),
                )));
                lines.push(Line::from(vec![
                    Span::styled(self.owner_label(task), Style::default().fg(Color::Cyan)),
                    dim(format!(" · P{}", task.priority)),
                ]));
                lines.push(Line::from(""));
            }
            if tasks.is_empty() {
                lines.push(Line::from(dim("No tasks")));
            }
            let widget = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .scroll((self.scroll, 0))
                .block(
                    Block::default()
                        .title(Span::styled(
                            format!(" {} ({}) ", column.label, tasks.len()),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ))
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                );
            f.render_widget(widget, *rect);
        }
    }

    fn render_agents(&self, f: &mut Frame, area: Rect) {
        let halves =
            Layout::horizontal([Constraint::Length(30), Constraint::Min(20)]).split(area);

        let items: Vec<Line> = self
            .snapshot
            .agents
            .iter()
            .enumerate()
            .map(|(i, agent)| {
                let open = stats::attention_tasks(agent).len();
                let style = if i == self.selected_agent {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    Span::styled(format!(" {} {:<16}", agent.emoji, agent.name), style),
                    Span::styled(
                        format!(" {:>2} ●", open),
                        Style::default().fg(agent_status_color(agent.status)),
                    ),
                ])
            })
            .collect();
        f.render_widget(Paragraph::new(items).block(bordered("Team")), halves[0]);

        let Some(agent) = self.snapshot.agents.get(self.selected_agent) else {
            f.render_widget(
                Paragraph::new("No agents in this database yet.").block(bordered("Agent")),
                halves[1],
            );
            return;
        };

        let detail = Layout::vertical([Constraint::Length(9), Constraint::Min(3)]).split(halves[1]);

        let profile = vec![
            Line::from(vec![
                Span::styled(
                    format!("{} {}", agent.emoji, agent.name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                dim(format!("  {} · {}", agent.role, agent.agent_type.as_str())),
            ]),
            Line::from(vec![
                Span::styled(
                    agent.status.as_str().to_uppercase(),
                    Style::default().fg(agent_status_color(agent.status)),
                ),
                dim(format!("  {}", agent.since_ago)),
            ]),
            Line::from(agent.status_reason.clone()),
            Line::from(""),
            Line::from(dim(agent.about.clone())),
            Line::from(Span::styled(
                agent.skills.join(" · "),
                Style::default().fg(Color::Magenta),
            )),
        ];
        f.render_widget(
            Paragraph::new(profile)
                .wrap(Wrap { trim: true })
                .block(bordered("Profile")),
            detail[0],
        );

        let mut filter_spans = vec![Span::styled(
            " ALL ",
            if self.task_filter.is_none() {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        )];
        for (column, count) in stats::column_counts(agent) {
            let selected = self.task_filter == Some(column.id);
            let style = if selected {
                Style::default().fg(Color::Black).bg(column_color(column.id))
            } else {
                Style::default().fg(column_color(column.id))
            };
            filter_spans.push(Span::styled(format!(" {} {} ", column.label, count), style));
        }

        let mut lines = vec![Line::from(filter_spans), Line::from("")];
        let tasks = stats::tasks_in_column(agent, self.task_filter);
        if tasks.is_empty() {
            lines.push(Line::from(dim("No tasks")));
        }
        for task in tasks {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<12}", task.status.as_str()),
                    Style::default().fg(column_color(task.status)),
                ),
                Span::styled(format!("P{} ", task.priority), Style::default().fg(Color::Yellow)),
                Span::raw(task.title.clone()),
                dim(format!("  {}d", task.days_ago)),
            ]));
            if !task.description.is_empty() {
                lines.push(Line::from(dim(format!("    {}", task.description))));
            }
            if !task.tags.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("    #{}", task.tags.join(" #")),
                    Style::default().fg(Color::Blue),
                )));
            }
        }
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(bordered("Tasks")),
            detail[1],
        );
    }

    fn offline_hint(&self) -> Option<Paragraph<'static>> {
        if self.snapshot.is_live {
            return None;
        }
        Some(Paragraph::new(vec![
            Line::from(""),
            Line::from(dim("Showing the built-in team. Run `mission-control setup` to connect a database.")),
        ]))
    }

    fn render_table(
        &self,
        f: &mut Frame,
        area: Rect,
        title: &str,
        rows: &[Row],
        columns: &[(&str, &str, Constraint)],
    ) {
        if let Some(hint) = self.offline_hint() {
            f.render_widget(hint.block(bordered(title)), area);
            return;
        }

        let header = TableRow::new(
            columns
                .iter()
                .map(|(_, label, _)| Cell::from(*label))
                .collect::<Vec<_>>(),
        )
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

        let body: Vec<TableRow> = rows
            .iter()
            .skip(self.scroll as usize)
            .map(|row| {
                TableRow::new(
                    columns
                        .iter()
                        .map(|(key, _, _)| Cell::from(row.text(key)))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let widths: Vec<Constraint> = columns.iter().map(|(_, _, w)| *w).collect();
        let table = Table::new(body, widths)
            .header(header)
            .block(bordered(&format!("{} ({})", title, rows.len())));
        f.render_widget(table, area);
    }

    fn render_runs(&self, f: &mut Frame, area: Rect) {
        self.render_table(
            f,
            area,
            "Agent Runs",
            &self.snapshot.runs,
            &[
                ("started_at", "Started", Constraint::Length(20)),
                ("agent_name", "Agent", Constraint::Length(16)),
                ("task_title", "Task", Constraint::Min(20)),
                ("status", "Status", Constraint::Length(8)),
                ("tokens_used", "Tokens", Constraint::Length(8)),
                ("cost_usd", "Cost $", Constraint::Length(8)),
                ("model", "Model", Constraint::Length(14)),
            ],
        );
    }

    fn render_memory(&self, f: &mut Frame, area: Rect) {
        self.render_table(
            f,
            area,
            "Memory Summaries",
            &self.snapshot.memory,
            &[
                ("created_at", "Created", Constraint::Length(20)),
                ("agent_id", "Agent", Constraint::Length(14)),
                ("summary", "Summary", Constraint::Min(30)),
            ],
        );
    }

    fn render_usage(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);
        let totals = stats::usage_totals(&self.snapshot.token_usage);
        let summary = Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} tokens ", totals.tokens),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            dim("· "),
            Span::styled(
                format!("${:.2} ", totals.cost_usd),
                Style::default().fg(Color::Green),
            ),
            dim(format!("· {} runs", totals.runs)),
        ]))
        .block(bordered("Totals"));
        f.render_widget(summary, chunks[0]);

        self.render_table(
            f,
            chunks[1],
            "Daily Usage",
            &self.snapshot.token_usage,
            &[
                ("date", "Date", Constraint::Length(12)),
                ("agent_name", "Agent", Constraint::Length(16)),
                ("tokens_used", "Tokens", Constraint::Length(10)),
                ("cost_usd", "Cost $", Constraint::Length(10)),
                ("run_count", "Runs", Constraint::Length(6)),
            ],
        );
    }

    fn render_activity(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = if self.activity.is_empty() {
            vec![Line::from(dim("No activity yet."))]
        } else {
            self.activity
                .iter()
                .map(|l| Line::from(Span::styled(l.as_str(), Style::default().fg(Color::Gray))))
                .collect()
        };
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0))
                .block(bordered("Activity")),
            area,
        );
    }
}
