use api_types::{
    catalog::PaperList,
    wallet::ProfileView,
};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub(crate) fn render_home(profile: &ProfileView) -> (String, InlineKeyboardMarkup) {
    let text = format!(
        "Bancarella • {} ⭐\nPapers owned: {}",
        profile.stars,
        profile.owned.len()
    );

    let kb = InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📚 Browse", "nav:depts"),
            InlineKeyboardButton::callback("👤 Profile", "nav:profile"),
        ],
        vec![
            InlineKeyboardButton::callback("⭐ Top up", "nav:topup"),
            InlineKeyboardButton::callback("ℹ️ About", "nav:about"),
        ],
    ]);

    (text, kb)
}

pub(crate) fn render_about() -> (String, InlineKeyboardMarkup) {
    let text = "Bancarella is a past-papers stall.\n\nBrowse by department, semester and year, pay with Telegram Stars, and everything you buy stays in your profile. Buying a whole year at once gets a 10% discount."
        .to_string();
    let kb = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⬅️ Home",
        "nav:home",
    )]]);
    (text, kb)
}

pub(crate) fn render_departments(departments: &[String]) -> (String, InlineKeyboardMarkup) {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for department in departments {
        rows.push(vec![InlineKeyboardButton::callback(
            department.clone(),
            format!("dept:{department}"),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Home", "nav:home")]);

    let text = if departments.is_empty() {
        "No departments yet.".to_string()
    } else {
        "Pick a department:".to_string()
    };
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_semesters(
    department: &str,
    semesters: &[String],
) -> (String, InlineKeyboardMarkup) {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for semester in semesters {
        rows.push(vec![InlineKeyboardButton::callback(
            semester.clone(),
            format!("sem:{semester}"),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Departments",
        "nav:depts",
    )]);

    let text = if semesters.is_empty() {
        format!("{department}: no semesters yet.")
    } else {
        format!("{department} • pick a semester:")
    };
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_years(
    department: &str,
    semester: &str,
    years: &[String],
) -> (String, InlineKeyboardMarkup) {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for year in years {
        rows.push(vec![InlineKeyboardButton::callback(
            year.clone(),
            format!("year:{year}"),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Semesters",
        format!("dept:{department}"),
    )]);

    let text = if years.is_empty() {
        format!("{department} / {semester}: no years yet.")
    } else {
        format!("{department} / {semester} • pick a year:")
    };
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_papers(
    department: &str,
    semester: &str,
    year: &str,
    papers: &PaperList,
) -> (String, InlineKeyboardMarkup) {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for paper in &papers.papers {
        rows.push(vec![InlineKeyboardButton::callback(
            format!("{} • {} ⭐", paper.name, paper.price),
            format!("paper:{}", paper.id),
        )]);
    }
    if papers.papers.len() > 1 {
        rows.push(vec![InlineKeyboardButton::callback(
            "🛒 Buy all (10% off)",
            "bulk",
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Years",
        format!("sem:{semester}"),
    )]);

    let text = if papers.papers.is_empty() {
        format!("{department} / {semester} / {year}: no papers yet.")
    } else {
        format!("{department} / {semester} / {year} • pick a paper:")
    };
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_profile(profile: &ProfileView) -> (String, InlineKeyboardMarkup) {
    let mut text = format!("Balance: {} ⭐\n\nYour papers:", profile.stars);
    if profile.owned.is_empty() {
        text.push_str("\n(none yet)");
    }
    for entry in &profile.owned {
        let paper = &entry.paper;
        text.push_str(&format!(
            "\n• {} ({} / {} / {}) • {}",
            paper.name,
            paper.department,
            paper.semester,
            paper.year,
            entry.granted_at.format("%Y-%m-%d"),
        ));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for entry in &profile.owned {
        rows.push(vec![InlineKeyboardButton::callback(
            format!("📄 {}", entry.paper.name),
            format!("paper:{}", entry.paper.id),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Home", "nav:home")]);

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_topup() -> (String, InlineKeyboardMarkup) {
    let amounts = [25i64, 50, 100, 250];
    let row = amounts
        .iter()
        .map(|amount| {
            InlineKeyboardButton::callback(format!("{amount} ⭐"), format!("topup:{amount}"))
        })
        .collect::<Vec<_>>();

    let kb = InlineKeyboardMarkup::new(vec![
        row,
        vec![InlineKeyboardButton::callback("⬅️ Home", "nav:home")],
    ]);
    ("How many stars do you want to add?".to_string(), kb)
}
