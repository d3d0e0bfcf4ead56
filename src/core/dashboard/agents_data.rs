//! Agent and task model shared by the live snapshot and the built-in dataset
//! shown when no database is configured.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Inbox,
    Assigned,
    InProgress,
    Review,
    Done,
    Waiting,
    /// Written by the task queue before an agent picks the task up.
    Pending,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Inbox => "inbox",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Pending => "pending",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn from_status(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbox" => Some(TaskStatus::Inbox),
            "assigned" => Some(TaskStatus::Assigned),
            "in-progress" | "in_progress" => Some(TaskStatus::InProgress),
            "review" => Some(TaskStatus::Review),
            "done" => Some(TaskStatus::Done),
            "waiting" => Some(TaskStatus::Waiting),
            "pending" => Some(TaskStatus::Pending),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Board column the status is shown under.
    pub fn column(&self) -> TaskStatus {
        match self {
            TaskStatus::Pending => TaskStatus::Inbox,
            TaskStatus::Failed => TaskStatus::Waiting,
            other => *other,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

pub struct TaskColumn {
    pub id: TaskStatus,
    pub label: &'static str,
}

pub const TASK_COLUMNS: [TaskColumn; 6] = [
    TaskColumn { id: TaskStatus::Inbox, label: "INBOX" },
    TaskColumn { id: TaskStatus::Assigned, label: "ASSIGNED" },
    TaskColumn { id: TaskStatus::InProgress, label: "IN PROGRESS" },
    TaskColumn { id: TaskStatus::Review, label: "REVIEW" },
    TaskColumn { id: TaskStatus::Done, label: "DONE" },
    TaskColumn { id: TaskStatus::Waiting, label: "WAITING" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentType {
    #[serde(rename = "LEAD")]
    Lead,
    #[serde(rename = "SPC")]
    Specialist,
    #[serde(rename = "INT")]
    Integration,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Lead => "LEAD",
            AgentType::Specialist => "SPC",
            AgentType::Integration => "INT",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEAD" => Some(AgentType::Lead),
            "SPC" => Some(AgentType::Specialist),
            "INT" => Some(AgentType::Integration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Working,
    Idle,
    Waiting,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Working => "working",
            AgentStatus::Idle => "idle",
            AgentStatus::Waiting => "waiting",
        }
    }

    pub fn from_status(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Some(AgentStatus::Working),
            "idle" => Some(AgentStatus::Idle),
            "waiting" => Some(AgentStatus::Waiting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTask {
    pub id: String,
    pub agent_id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// 1 (urgent) to 3 (low).
    pub priority: u8,
    pub tags: Vec<String>,
    pub days_ago: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub emoji: String,
    pub about: String,
    pub skills: Vec<String>,
    pub status_reason: String,
    pub since_ago: String,
    pub tasks: Vec<AgentTask>,
}

struct TaskSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: u8,
    tags: &'static [&'static str],
    days_ago: i64,
}

const fn task(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: u8,
    tags: &'static [&'static str],
    days_ago: i64,
) -> TaskSeed {
    TaskSeed {
        id,
        title,
        description,
        status,
        priority,
        tags,
        days_ago,
    }
}

struct AgentSeed {
    id: &'static str,
    name: &'static str,
    role: &'static str,
    agent_type: AgentType,
    status: AgentStatus,
    emoji: &'static str,
    about: &'static str,
    skills: &'static [&'static str],
    status_reason: &'static str,
    since_ago: &'static str,
    tasks: &'static [TaskSeed],
}

impl AgentSeed {
    fn to_agent(&self) -> Agent {
        Agent {
            id: self.id.to_string(),
            name: self.name.to_string(),
            role: self.role.to_string(),
            agent_type: self.agent_type,
            status: self.status,
            emoji: self.emoji.to_string(),
            about: self.about.to_string(),
            skills: self.skills.iter().map(|s| s.to_string()).collect(),
            status_reason: self.status_reason.to_string(),
            since_ago: self.since_ago.to_string(),
            tasks: self
                .tasks
                .iter()
                .map(|t| AgentTask {
                    id: t.id.to_string(),
                    agent_id: self.id.to_string(),
                    title: t.title.to_string(),
                    description: t.description.to_string(),
                    status: t.status,
                    priority: t.priority,
                    tags: t.tags.iter().map(|s| s.to_string()).collect(),
                    days_ago: t.days_ago,
                })
                .collect(),
        }
    }
}

/// The built-in team, in display order.
pub fn static_agents() -> Vec<Agent> {
    AGENTS.iter().map(AgentSeed::to_agent).collect()
}

const AGENTS: &[AgentSeed] = &[
    AgentSeed {
        id: "max",
        name: "Max",
        role: "Director of Strategy",
        agent_type: AgentType::Lead,
        status: AgentStatus::Working,
        emoji: "🧠",
        about: "I am Max, Director of Strategy. I set direction, resolve ambiguity, and keep the team aligned. Every decision is a calculated bet on the best outcome.",
        skills: &["leadership", "strategy", "vision", "decision-making", "prioritization"],
        status_reason: "Running weekly planning sync. Reviewing website conversion metrics and aligning team on Q1 targets.",
        since_ago: "2h ago",
        tasks: &[
            task("m1", "Q1 OKR Alignment", "Define measurable objectives for all agents across acquisition, activation, and retention.", TaskStatus::InProgress, 1, &["strategy", "okr", "q1"], 1),
            task("m2", "Website Conversion Audit", "Review funnel data and identify top 3 drop-off points to address before product launch.", TaskStatus::Review, 1, &["conversion", "analytics"], 2),
            task("m3", "Investor Brief - Series A Narrative", "Draft the strategic narrative deck: problem, solution, traction, and ask.", TaskStatus::Assigned, 2, &["fundraising", "narrative"], 3),
            task("m4", "Competitive Positioning Doc", "Map SellSig against Gong, Chorus, and Clari on 6 key dimensions.", TaskStatus::Done, 2, &["competitive", "positioning"], 5),
            task("m5", "Team Capacity Review", "Audit current agent load and reassign overloaded tasks.", TaskStatus::Waiting, 3, &["ops", "team"], 0),
        ],
    },
    AgentSeed {
        id: "jordan",
        name: "Jordan",
        role: "Project Operations Lead",
        agent_type: AgentType::Lead,
        status: AgentStatus::Working,
        emoji: "⚡",
        about: "I am Jordan, Ops Lead. I turn strategy into deliverables. I own the project board, unblock the team, and make sure nothing slips through the cracks.",
        skills: &["project-management", "execution", "ops", "unblocking", "coordination"],
        status_reason: "Coordinating domain transfer to sellsig.com. Running deployment checklist with Taylor.",
        since_ago: "45m ago",
        tasks: &[
            task("j1", "Domain Transfer - sellsig.com", "Transfer domain from registrar, update DNS, verify SSL certificate on Lovable deploy.", TaskStatus::InProgress, 1, &["domain", "devops", "launch"], 1),
            task("j2", "Sprint Board Cleanup", "Archive completed tasks, re-prioritize backlog, assign unassigned items.", TaskStatus::Assigned, 2, &["ops", "board"], 2),
            task("j3", "Launch Checklist v2", "Update the go-live checklist with remaining items: analytics, forms, legal links.", TaskStatus::Review, 1, &["launch", "checklist"], 3),
            task("j4", "Weekly Briefing Doc", "Compile agent outputs into the Monday briefing for Max review.", TaskStatus::Done, 2, &["reporting", "weekly"], 6),
            task("j5", "Onboard CSO to Systems", "Provide CSO access to repo, secrets vault, and security framework docs.", TaskStatus::Inbox, 3, &["onboarding", "security"], 0),
        ],
    },
    AgentSeed {
        id: "sage",
        name: "Sage",
        role: "Brand & Messaging Specialist",
        agent_type: AgentType::Specialist,
        status: AgentStatus::Working,
        emoji: "✍️",
        about: "I am Sage. Words are my craft. I build brand voice, write copy that converts, and make sure SellSig sounds like a category leader before it becomes one.",
        skills: &["copywriting", "brand-voice", "messaging", "headlines", "cta"],
        status_reason: "Finalizing hero headline A/B variants. Awaiting Riley's UX review before handoff.",
        since_ago: "1h ago",
        tasks: &[
            task("s1", "Hero Headline A/B Variants", "Write 5 headline variants for hero section. Focus on signal-vs-noise angle and buyer-intent messaging.", TaskStatus::InProgress, 1, &["copy", "hero", "ab-test"], 1),
            task("s2", "Pricing Page Copy", "Write value-led copy for Starter, Pro, Enterprise tiers. Highlight ROI per plan.", TaskStatus::Assigned, 1, &["pricing", "copy"], 2),
            task("s3", "Brand Voice Guidelines Doc", "Document SellSig tone: confident, data-driven, human. Include do/don't examples.", TaskStatus::Review, 2, &["brand", "guidelines"], 4),
            task("s4", "Homepage Subheadlines", "Write 3 supporting subheadlines for features section below hero.", TaskStatus::Done, 2, &["copy", "homepage"], 5),
        ],
    },
    AgentSeed {
        id: "taylor",
        name: "Taylor",
        role: "DevOps & Deployment",
        agent_type: AgentType::Integration,
        status: AgentStatus::Working,
        emoji: "🔧",
        about: "I am Taylor. I make sure the code ships, the site stays up, and the infra scales. Fast deploys and zero-downtime are my baseline.",
        skills: &["deployment", "ci-cd", "dns", "performance", "monitoring"],
        status_reason: "Running build pipeline verification. Checking Core Web Vitals on staging.",
        since_ago: "30m ago",
        tasks: &[
            task("t1", "Deploy Staging to Production", "Run full deployment checklist: build pass, env vars, SSL, DNS propagation, smoke test.", TaskStatus::InProgress, 1, &["deploy", "production"], 0),
            task("t2", "Core Web Vitals Audit", "Achieve LCP <2.5s, FID <100ms, CLS <0.1 on all key pages.", TaskStatus::Assigned, 1, &["performance", "seo", "cwv"], 1),
            task("t3", "Uptime Monitoring Setup", "Configure Uptime Robot or BetterStack to alert on any downtime within 1 minute.", TaskStatus::Inbox, 2, &["monitoring", "ops"], 0),
            task("t4", "CDN Configuration", "Enable edge caching for assets. Target: 95%+ cache hit rate on static files.", TaskStatus::Review, 2, &["cdn", "performance"], 3),
            task("t5", "Staging Environment Setup", "Configure separate staging URL for QA before each production push.", TaskStatus::Done, 3, &["staging", "qa"], 7),
        ],
    },
    AgentSeed {
        id: "morgan",
        name: "Morgan",
        role: "Competitive Intelligence",
        agent_type: AgentType::Specialist,
        status: AgentStatus::Working,
        emoji: "🔍",
        about: "I am Morgan. I track the competition so we can out-position them. I find the gaps in Gong, Chorus, and Clari that SellSig can own.",
        skills: &["research", "competitive-analysis", "positioning", "market-intel", "pricing"],
        status_reason: "Building win/loss framework. Cross-referencing Gong G2 reviews for pain points.",
        since_ago: "2h ago",
        tasks: &[
            task("mo1", "Gong Win/Loss Analysis", "Extract top 50 negative Gong reviews from G2, Capterra, Reddit. Tag by theme.", TaskStatus::InProgress, 1, &["gong", "win-loss", "research"], 2),
            task("mo2", "Pricing Benchmark Report", "Map competitor pricing tiers, seat costs, and contract structures for sales enablement.", TaskStatus::Assigned, 1, &["pricing", "benchmark"], 1),
            task("mo3", "ICP Definition", "Define Ideal Customer Profile: company size, stack, pain, budget, buying trigger.", TaskStatus::Review, 1, &["icp", "targeting"], 4),
            task("mo4", "Gong.io Full Analysis", "Complete competitive teardown: features, pricing, positioning, weaknesses.", TaskStatus::Done, 2, &["gong", "competitive"], 6),
        ],
    },
    AgentSeed {
        id: "email-expert",
        name: "Email Expert",
        role: "Email Marketing Specialist",
        agent_type: AgentType::Specialist,
        status: AgentStatus::Working,
        emoji: "📧",
        about: "I am the Email Expert. I build sequences that convert, nurture pipelines, and turn cold leads warm. Every email has a job to do.",
        skills: &["email-copy", "sequences", "automation", "segmentation", "deliverability"],
        status_reason: "Setting up welcome sequence in email service. Waiting on sign-up form integration.",
        since_ago: "3h ago",
        tasks: &[
            task("e1", "Integrate Sign-Up Form", "Connect hero email capture form to email platform. Set up welcome trigger automation.", TaskStatus::Waiting, 1, &["integration", "form", "automation"], 0),
            task("e2", "Welcome Sequence - A/B Subject Lines", "Test 2 subject line approaches: curiosity-led vs data-led. Measure open rate difference.", TaskStatus::Assigned, 1, &["email", "ab-test", "subjects"], 1),
            task("e3", "Re-engagement Campaign", "3-email campaign for 30-day inactive subscribers. Goal: 15% reactivation rate.", TaskStatus::Inbox, 2, &["re-engagement", "retention"], 0),
            task("e4", "5-Email Welcome Sequence", "Welcome → Value → Social Proof → Features → CTA. Deliverables delivered.", TaskStatus::Done, 1, &["welcome", "sequence"], 6),
        ],
    },
    AgentSeed {
        id: "seo",
        name: "SEO Expert",
        role: "SEO & Content Strategy",
        agent_type: AgentType::Specialist,
        status: AgentStatus::Working,
        emoji: "📈",
        about: "I am the SEO Expert. I get SellSig to page one. Keyword targeting, technical SEO, and content architecture are my weapons.",
        skills: &["seo", "keywords", "content-strategy", "schema", "link-building"],
        status_reason: "Implementing JSON-LD schema on product pages. Running Lighthouse audit.",
        since_ago: "1h ago",
        tasks: &[
            task("se1", "JSON-LD Schema Implementation", "Add Product, Organization, and FAQ schema to key pages. Target: rich results in 30 days.", TaskStatus::InProgress, 1, &["schema", "technical-seo"], 1),
            task("se2", "Content Cluster - Buyer Signals", "Build 5-article cluster: pillar + 4 supporting pieces targeting buyer-intent keywords.", TaskStatus::Assigned, 1, &["content", "cluster", "keywords"], 2),
            task("se3", "Backlink Outreach List", "Identify 20 high-DA sales/revenue sites for guest post or link placement opportunities.", TaskStatus::Inbox, 2, &["backlinks", "outreach"], 0),
            task("se4", "SEO Strategy Document", "Site structure, meta tags, keyword map, and 90-day roadmap.", TaskStatus::Done, 1, &["strategy", "roadmap"], 5),
        ],
    },
    AgentSeed {
        id: "legal",
        name: "Legal Counsel",
        role: "Legal & Compliance",
        agent_type: AgentType::Integration,
        status: AgentStatus::Idle,
        emoji: "⚖️",
        about: "I am Legal Counsel. I protect SellSig from liability and ensure compliance. GDPR, CCPA, FTC: I make sure we stay clean.",
        skills: &["gdpr", "ccpa", "privacy", "terms", "compliance", "ftc"],
        status_reason: "Legal docs delivered. Monitoring for regulatory changes. Available for review requests.",
        since_ago: "4h ago",
        tasks: &[
            task("l1", "SOC 2 Readiness Assessment", "Evaluate current practices against SOC 2 Type 1 criteria. Identify gaps and create remediation plan.", TaskStatus::Inbox, 1, &["soc2", "compliance"], 0),
            task("l2", "FTC AI Claims Review", "Review all marketing copy for FTC-compliant AI claims. Flag any performance guarantees.", TaskStatus::Assigned, 1, &["ftc", "review", "ai-claims"], 1),
            task("l3", "GDPR Data Processing Addendum", "Draft DPA for B2B customer contracts. Required for EU/UK enterprise sales.", TaskStatus::Inbox, 2, &["gdpr", "dpa", "enterprise"], 0),
            task("l4", "Privacy Policy + ToS + Cookie Policy", "GDPR & CCPA compliant. Delaware governing law. All delivered.", TaskStatus::Done, 1, &["privacy", "terms", "cookie"], 5),
        ],
    },
    AgentSeed {
        id: "cso",
        name: "CSO",
        role: "Chief Security Officer",
        agent_type: AgentType::Integration,
        status: AgentStatus::Working,
        emoji: "🛡️",
        about: "I am the CSO. I secure SellSig's infrastructure, data, and reputation. Breaches don't happen on my watch.",
        skills: &["security", "soc2", "vulnerability-assessment", "hardening", "pen-testing"],
        status_reason: "Running initial vulnerability assessment on the application stack.",
        since_ago: "1h ago",
        tasks: &[
            task("c1", "Vulnerability Assessment", "Scan application dependencies, API endpoints, and auth flows for known CVEs and misconfigurations.", TaskStatus::InProgress, 1, &["security", "scanning", "cve"], 1),
            task("c2", "SOC 2 Prep Roadmap", "Build 6-month roadmap to SOC 2 Type 1 certification. Prioritize by sales impact.", TaskStatus::Assigned, 1, &["soc2", "roadmap"], 2),
            task("c3", "Security Hardening Checklist", "Implement OWASP Top 10 mitigations, CSP headers, rate limiting, and secrets rotation.", TaskStatus::Review, 1, &["hardening", "owasp"], 3),
            task("c4", "Security Brain + Framework", "Initial security posture documented. Core framework established.", TaskStatus::Done, 1, &["framework", "posture"], 6),
        ],
    },
];
