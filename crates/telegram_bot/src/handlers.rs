use api_types::{
    catalog::{BranchNew, PaperNew, PriceUpdate, Prune},
    purchase::{
        BulkPurchaseNew, BulkPurchaseResult, PurchaseNew, PurchaseResult, ReconcileNew,
        ReconcileResult,
    },
    wallet::TopUpNew,
};
use reqwest::StatusCode;
use teloxide::{
    prelude::*,
    types::{
        CallbackQuery, ChatId, FileId, InlineKeyboardMarkup, InputFile, LabeledPrice,
        PreCheckoutQuery, Recipient, SuccessfulPayment, User,
    },
};

use crate::{
    ConfigParameters,
    api::ApiError,
    state::PendingAction,
    ui,
};

/// Telegram Stars currency code. Star invoices carry no provider token.
const STARS_CURRENCY: &str = "XTR";

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0;
    let chat_id = msg.chat.id;

    if let Some(payment) = msg.successful_payment() {
        return handle_successful_payment(&bot, chat_id, user_id, &cfg, payment).await;
    }

    if !ensure_subscribed(&bot, chat_id, from, &cfg).await? {
        return Ok(());
    }

    // A pending admin upload consumes the next document message.
    if let Some(pending) = cfg.sessions.get(chat_id).await.pending
        && handle_pending_message(&bot, &msg, &cfg, pending).await?
    {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Some(cmd) = parse_command(text) {
        match cmd {
            Command::Start | Command::Home => {
                cfg.sessions
                    .update(chat_id, |s| {
                        s.nav = Default::default();
                        s.pending = None;
                    })
                    .await;
                show_home(&bot, chat_id, user_id, &cfg).await?;
            }
            Command::Profile => {
                show_profile(&bot, chat_id, user_id, &cfg).await?;
            }
            Command::About => {
                let (text, kb) = ui::render_about();
                edit_or_send(&bot, chat_id, &cfg, text, kb).await?;
            }
            Command::Help => {
                let help = if is_admin(&cfg, Some(from)) {
                    format!("{}\n\n{}", help_text(), admin_help_text())
                } else {
                    help_text().to_string()
                };
                bot.send_message(chat_id, help).await?;
            }
        }
        return Ok(());
    }

    if let Some(cmd) = parse_admin_command(text) {
        if !is_admin(&cfg, Some(from)) {
            bot.send_message(chat_id, "This command is for admins only.")
                .await?;
            return Ok(());
        }
        handle_admin_command(&bot, chat_id, &cfg, cmd).await?;
    }

    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let user_id = q.from.id.0;

    let _ = bot.answer_callback_query(q.id.clone()).await;

    if !ensure_subscribed(&bot, chat_id, &q.from, &cfg).await? {
        return Ok(());
    }

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    if data == "nav:home" {
        cfg.sessions
            .update(chat_id, |s| s.nav = Default::default())
            .await;
        show_home(&bot, chat_id, user_id, &cfg).await?;
    } else if data == "nav:depts" {
        cfg.sessions
            .update(chat_id, |s| s.nav = Default::default())
            .await;
        show_departments(&bot, chat_id, &cfg).await?;
    } else if data == "nav:profile" {
        show_profile(&bot, chat_id, user_id, &cfg).await?;
    } else if data == "nav:topup" {
        let (text, kb) = ui::render_topup();
        edit_or_send(&bot, chat_id, &cfg, text, kb).await?;
    } else if data == "nav:about" {
        let (text, kb) = ui::render_about();
        edit_or_send(&bot, chat_id, &cfg, text, kb).await?;
    } else if let Some(department) = data.strip_prefix("dept:") {
        let department = department.to_string();
        cfg.sessions
            .update(chat_id, |s| {
                s.nav.department = Some(department.clone());
                s.nav.semester = None;
                s.nav.year = None;
            })
            .await;
        show_semesters(&bot, chat_id, &cfg, &department).await?;
    } else if let Some(semester) = data.strip_prefix("sem:") {
        let semester = semester.to_string();
        let session = cfg
            .sessions
            .update(chat_id, |s| {
                s.nav.semester = Some(semester.clone());
                s.nav.year = None;
            })
            .await;
        let Some(department) = session.nav.department else {
            show_departments(&bot, chat_id, &cfg).await?;
            return Ok(());
        };
        show_years(&bot, chat_id, &cfg, &department, &semester).await?;
    } else if let Some(year) = data.strip_prefix("year:") {
        let year = year.to_string();
        let session = cfg
            .sessions
            .update(chat_id, |s| s.nav.year = Some(year.clone()))
            .await;
        let (Some(department), Some(semester)) = (session.nav.department, session.nav.semester)
        else {
            show_departments(&bot, chat_id, &cfg).await?;
            return Ok(());
        };
        show_papers(&bot, chat_id, &cfg, &department, &semester, &year).await?;
    } else if let Some(paper_id) = data.strip_prefix("paper:") {
        let Ok(paper_id) = paper_id.parse::<i64>() else {
            bot.send_message(chat_id, "Unknown paper.").await?;
            return Ok(());
        };
        purchase_paper(&bot, chat_id, user_id, &cfg, paper_id).await?;
    } else if data == "bulk" {
        let nav = cfg.sessions.get(chat_id).await.nav;
        let (Some(department), Some(semester), Some(year)) =
            (nav.department, nav.semester, nav.year)
        else {
            show_departments(&bot, chat_id, &cfg).await?;
            return Ok(());
        };
        purchase_bulk(&bot, chat_id, user_id, &cfg, &department, &semester, &year).await?;
    } else if let Some(amount) = data.strip_prefix("topup:") {
        let Ok(amount) = amount.parse::<i64>() else {
            return Ok(());
        };
        start_topup(&bot, chat_id, user_id, &cfg, amount).await?;
    }

    Ok(())
}

pub(crate) async fn handle_pre_checkout(
    bot: Bot,
    q: PreCheckoutQuery,
    _cfg: ConfigParameters,
) -> ResponseResult<()> {
    // The server revalidates everything at reconciliation; approve here so
    // the payment sheet never stalls.
    bot.answer_pre_checkout_query(q.id, true).await?;
    Ok(())
}

async fn handle_successful_payment(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    payment: &SuccessfulPayment,
) -> ResponseResult<()> {
    let charge_id = payment.telegram_payment_charge_id.clone().0;
    let outcome = cfg
        .api
        .reconcile(
            user_id,
            &ReconcileNew {
                payload: payment.invoice_payload.clone(),
                amount: i64::from(payment.total_amount),
                charge_id: charge_id.clone(),
            },
        )
        .await;

    match outcome {
        Ok(ReconcileResult::Credited {
            amount,
            new_balance,
        }) => {
            bot.send_message(
                chat_id,
                format!("✅ +{amount} ⭐ added. Balance: {new_balance} ⭐."),
            )
            .await?;
        }
        Ok(ReconcileResult::Granted { papers }) => {
            if papers.is_empty() {
                bot.send_message(chat_id, "✅ Payment received. You already own everything.")
                    .await?;
            } else {
                bot.send_message(
                    chat_id,
                    format!("✅ Payment received. {} paper(s) unlocked.", papers.len()),
                )
                .await?;
                for paper in &papers {
                    deliver_paper(bot, chat_id, &paper.name, &paper.locator).await?;
                }
            }
        }
        Ok(ReconcileResult::Replayed) => {
            bot.send_message(chat_id, "This payment was already processed.")
                .await?;
        }
        Err(err) => {
            tracing::error!("reconciliation failed for charge {charge_id}: {err}");
            bot.send_message(
                chat_id,
                "Your payment arrived but could not be applied yet. It will be retried; contact an admin if nothing happens.",
            )
            .await?;
        }
    }

    show_home(bot, chat_id, user_id, cfg).await
}

async fn handle_pending_message(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    pending: PendingAction,
) -> ResponseResult<bool> {
    let chat_id = msg.chat.id;
    match pending {
        PendingAction::PaperDocument {
            department,
            semester,
            year,
            name,
            price,
        } => {
            let Some(document) = msg.document() else {
                // Any text cancels the upload.
                if msg.text().is_some() {
                    cfg.sessions.update(chat_id, |s| s.pending = None).await;
                    bot.send_message(chat_id, "Upload cancelled.").await?;
                    return Ok(true);
                }
                return Ok(false);
            };

            let locator = document.file.id.clone().0;
            cfg.sessions.update(chat_id, |s| s.pending = None).await;

            let created = cfg
                .api
                .new_paper(&PaperNew {
                    department,
                    semester,
                    year,
                    name,
                    locator,
                    price,
                })
                .await;
            match created {
                Ok(paper) => {
                    bot.send_message(
                        chat_id,
                        format!(
                            "✅ Paper #{} \"{}\" added at {} ⭐.",
                            paper.id, paper.name, paper.price
                        ),
                    )
                    .await?;
                    announce_new_paper(bot, cfg, &paper).await;
                }
                Err(err) => {
                    bot.send_message(chat_id, user_message_for_api_error(err))
                        .await?;
                }
            }
            Ok(true)
        }
    }
}

async fn handle_admin_command(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    cmd: AdminCommand,
) -> ResponseResult<()> {
    match cmd {
        AdminCommand::AddDepartment { department } => {
            let result = cfg
                .api
                .new_branch(&BranchNew {
                    department,
                    semester: None,
                    year: None,
                })
                .await;
            report_admin_result(bot, chat_id, result.map(|()| "Department added.".to_string()))
                .await
        }
        AdminCommand::AddSemester {
            department,
            semester,
        } => {
            let result = cfg
                .api
                .new_branch(&BranchNew {
                    department,
                    semester: Some(semester),
                    year: None,
                })
                .await;
            report_admin_result(bot, chat_id, result.map(|()| "Semester added.".to_string()))
                .await
        }
        AdminCommand::AddYear {
            department,
            semester,
            year,
        } => {
            let result = cfg
                .api
                .new_branch(&BranchNew {
                    department,
                    semester: Some(semester),
                    year: Some(year),
                })
                .await;
            report_admin_result(bot, chat_id, result.map(|()| "Year added.".to_string())).await
        }
        AdminCommand::UploadPaper {
            department,
            semester,
            year,
            name,
        } => {
            cfg.sessions
                .update(chat_id, |s| {
                    s.pending = Some(PendingAction::PaperDocument {
                        department,
                        semester,
                        year,
                        name,
                        price: None,
                    })
                })
                .await;
            bot.send_message(chat_id, "Now send the paper as a document.")
                .await?;
            Ok(())
        }
        AdminCommand::RemovePaper {
            department,
            semester,
            year,
            name,
        } => {
            let result = cfg
                .api
                .prune(&Prune {
                    department,
                    semester: Some(semester),
                    year: Some(year),
                    name: Some(name),
                })
                .await;
            report_admin_result(
                bot,
                chat_id,
                result.map(|pruned| format!("Removed {} entr(y/ies).", pruned.removed)),
            )
            .await
        }
        AdminCommand::Prune {
            department,
            semester,
            year,
        } => {
            let result = cfg
                .api
                .prune(&Prune {
                    department,
                    semester,
                    year,
                    name: None,
                })
                .await;
            report_admin_result(
                bot,
                chat_id,
                result.map(|pruned| format!("Removed {} entr(y/ies).", pruned.removed)),
            )
            .await
        }
        AdminCommand::SetPrice { paper_id, price } => {
            let result = cfg.api.set_price(paper_id, &PriceUpdate { price }).await;
            report_admin_result(bot, chat_id, result.map(|()| "Price updated.".to_string()))
                .await
        }
        AdminCommand::NotifyAll { text } => {
            let ids = match cfg.api.telegram_ids().await {
                Ok(ids) => ids.ids,
                Err(err) => {
                    bot.send_message(chat_id, user_message_for_api_error(err))
                        .await?;
                    return Ok(());
                }
            };

            let delivered = broadcast(bot, &ids, &text).await;
            bot.send_message(chat_id, format!("Broadcast delivered to {delivered} user(s)."))
                .await?;
            Ok(())
        }
    }
}

async fn report_admin_result(
    bot: &Bot,
    chat_id: ChatId,
    result: Result<String, ApiError>,
) -> ResponseResult<()> {
    match result {
        Ok(message) => bot.send_message(chat_id, format!("✅ {message}")).await?,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?
        }
    };
    Ok(())
}

async fn show_home(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
) -> ResponseResult<()> {
    let profile = match cfg.api.profile(user_id).await {
        Ok(p) => p,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let (text, kb) = ui::render_home(&profile);
    edit_or_send(bot, chat_id, cfg, text, kb).await
}

async fn show_departments(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
) -> ResponseResult<()> {
    let departments = match cfg.api.departments().await {
        Ok(list) => list.departments,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let (text, kb) = ui::render_departments(&departments);
    edit_or_send(bot, chat_id, cfg, text, kb).await
}

async fn show_semesters(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    department: &str,
) -> ResponseResult<()> {
    let semesters = match cfg.api.semesters(department).await {
        Ok(list) => list.semesters,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let (text, kb) = ui::render_semesters(department, &semesters);
    edit_or_send(bot, chat_id, cfg, text, kb).await
}

async fn show_years(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    department: &str,
    semester: &str,
) -> ResponseResult<()> {
    let years = match cfg.api.years(department, semester).await {
        Ok(list) => list.years,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let (text, kb) = ui::render_years(department, semester, &years);
    edit_or_send(bot, chat_id, cfg, text, kb).await
}

async fn show_papers(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    department: &str,
    semester: &str,
    year: &str,
) -> ResponseResult<()> {
    let papers = match cfg.api.papers(department, semester, year).await {
        Ok(list) => list,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let (text, kb) = ui::render_papers(department, semester, year, &papers);
    edit_or_send(bot, chat_id, cfg, text, kb).await
}

async fn show_profile(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
) -> ResponseResult<()> {
    let profile = match cfg.api.profile(user_id).await {
        Ok(p) => p,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    let (text, kb) = ui::render_profile(&profile);
    edit_or_send(bot, chat_id, cfg, text, kb).await
}

async fn purchase_paper(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    paper_id: i64,
) -> ResponseResult<()> {
    let result = cfg.api.purchase(user_id, &PurchaseNew { paper_id }).await;

    match result {
        Ok(PurchaseResult::AlreadyOwned { name, locator }) => {
            bot.send_message(chat_id, "Already yours, here it is again:")
                .await?;
            deliver_paper(bot, chat_id, &name, &locator).await?;
        }
        Ok(PurchaseResult::Purchased {
            name,
            locator,
            remaining_stars,
        }) => {
            bot.send_message(
                chat_id,
                format!("✅ Purchased. {remaining_stars} ⭐ left."),
            )
            .await?;
            deliver_paper(bot, chat_id, &name, &locator).await?;
        }
        Ok(PurchaseResult::InvoiceRequired { invoice }) => {
            send_stars_invoice(bot, chat_id, &invoice).await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
        }
    }

    Ok(())
}

async fn purchase_bulk(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    department: &str,
    semester: &str,
    year: &str,
) -> ResponseResult<()> {
    let result = cfg
        .api
        .purchase_bulk(
            user_id,
            &BulkPurchaseNew {
                department: department.to_string(),
                semester: semester.to_string(),
                year: year.to_string(),
            },
        )
        .await;

    match result {
        Ok(BulkPurchaseResult::AlreadyOwnedAll) => {
            bot.send_message(chat_id, "You already own every paper here.")
                .await?;
        }
        Ok(BulkPurchaseResult::Purchased {
            papers,
            charged,
            remaining_stars,
        }) => {
            bot.send_message(
                chat_id,
                format!(
                    "✅ {} paper(s) for {charged} ⭐. {remaining_stars} ⭐ left.",
                    papers.len()
                ),
            )
            .await?;
            for paper in &papers {
                deliver_paper(bot, chat_id, &paper.name, &paper.locator).await?;
            }
        }
        Ok(BulkPurchaseResult::InvoiceRequired { invoice }) => {
            send_stars_invoice(bot, chat_id, &invoice).await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
        }
    }

    Ok(())
}

async fn start_topup(
    bot: &Bot,
    chat_id: ChatId,
    user_id: u64,
    cfg: &ConfigParameters,
    amount: i64,
) -> ResponseResult<()> {
    let invoice = match cfg.api.topup(user_id, &TopUpNew { amount }).await {
        Ok(v) => v,
        Err(err) => {
            bot.send_message(chat_id, user_message_for_api_error(err))
                .await?;
            return Ok(());
        }
    };
    send_stars_invoice(bot, chat_id, &invoice).await
}

async fn send_stars_invoice(
    bot: &Bot,
    chat_id: ChatId,
    invoice: &api_types::wallet::InvoiceView,
) -> ResponseResult<()> {
    bot.send_invoice(
        chat_id,
        invoice.title.clone(),
        invoice.description.clone(),
        invoice.payload.clone(),
        STARS_CURRENCY,
        vec![LabeledPrice {
            label: invoice.title.clone(),
            amount: stars_price(invoice.amount),
        }],
    )
    .await?;
    Ok(())
}

/// Invoice amounts are `i64` stars on the wire; the provider wants `u32`.
fn stars_price(amount: i64) -> u32 {
    u32::try_from(amount).unwrap_or(u32::MAX)
}

async fn deliver_paper(
    bot: &Bot,
    chat_id: ChatId,
    name: &str,
    locator: &str,
) -> ResponseResult<()> {
    let file = InputFile::file_id(FileId(locator.to_string()));
    if let Err(err) = bot.send_document(chat_id, file).await {
        tracing::error!("delivery of \"{name}\" failed: {err}");
        bot.send_message(
            chat_id,
            "The file could not be sent. Contact an admin, your purchase is safe.",
        )
        .await?;
    }
    Ok(())
}

async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    text: String,
    kb: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    let session = cfg.sessions.get(chat_id).await;
    if let Some(message_id) = session.hub_message_id
        && bot
            .edit_message_text(chat_id, message_id, text.clone())
            .reply_markup(kb.clone())
            .await
            .is_ok()
    {
        return Ok(());
    }

    let sent = bot.send_message(chat_id, text).reply_markup(kb).await?;
    cfg.sessions
        .update(chat_id, |s| s.hub_message_id = Some(sent.id))
        .await;
    Ok(())
}

/// Membership gate over the configured channels. Admins pass, and payment
/// confirmations never go through here; paid money is applied regardless.
async fn ensure_subscribed(
    bot: &Bot,
    chat_id: ChatId,
    user: &User,
    cfg: &ConfigParameters,
) -> ResponseResult<bool> {
    if cfg.required_channels.is_empty() || is_admin(cfg, Some(user)) {
        return Ok(true);
    }

    for channel in &cfg.required_channels {
        let member = match bot
            .get_chat_member(Recipient::ChannelUsername(channel.clone()), user.id)
            .await
        {
            Ok(member) => member,
            Err(err) => {
                // A misconfigured channel must not lock everyone out.
                tracing::warn!("membership check against {channel} failed: {err}");
                continue;
            }
        };
        if !member.is_present() {
            let links = cfg
                .required_channels
                .iter()
                .map(|channel| channel_url(channel))
                .collect::<Vec<_>>()
                .join("\n");
            bot.send_message(
                chat_id,
                format!("Join our channel(s) first, then come back with /start:\n{links}"),
            )
            .await?;
            return Ok(false);
        }
    }

    Ok(true)
}

fn channel_url(channel: &str) -> String {
    format!("https://t.me/{}", channel.trim_start_matches('@'))
}

/// Tell every known account about a freshly uploaded paper. Failures only
/// warn; the upload itself already succeeded.
async fn announce_new_paper(
    bot: &Bot,
    cfg: &ConfigParameters,
    paper: &api_types::catalog::PaperView,
) {
    let ids = match cfg.api.telegram_ids().await {
        Ok(ids) => ids.ids,
        Err(err) => {
            tracing::warn!("new-paper announcement skipped: {err}");
            return;
        }
    };
    let text = format!(
        "📄 New paper: {} ({} / {} / {})",
        paper.name, paper.department, paper.semester, paper.year
    );
    let delivered = broadcast(bot, &ids, &text).await;
    tracing::info!("announced \"{}\" to {delivered} user(s)", paper.name);
}

async fn broadcast(bot: &Bot, ids: &[i64], text: &str) -> usize {
    let mut delivered = 0usize;
    for &id in ids {
        match bot.send_message(ChatId(id), text.to_string()).await {
            Ok(_) => delivered += 1,
            Err(err) => tracing::warn!("broadcast to {id} failed: {err}"),
        }
    }
    delivered
}

fn is_admin(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    cfg.admin_users.contains(&from.id)
}

fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let mut parts = trimmed.splitn(2, ' ');
    match parts.next().unwrap_or("") {
        "/start" => Some(Command::Start),
        "/home" => Some(Command::Home),
        "/profile" | "/history" => Some(Command::Profile),
        "/about" => Some(Command::About),
        "/help" => Some(Command::Help),
        _ => None,
    }
}

/// Admin commands take space-separated segments; the paper name comes last
/// and may contain spaces.
fn parse_admin_command(text: &str) -> Option<AdminCommand> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let mut parts = trimmed.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match cmd {
        "/adddept" => (!rest.is_empty()).then(|| AdminCommand::AddDepartment {
            department: rest.to_string(),
        }),
        "/addsem" => {
            let (department, semester) = split_segments2(rest)?;
            Some(AdminCommand::AddSemester {
                department,
                semester,
            })
        }
        "/addyear" => {
            let (department, semester, year) = split_segments3(rest)?;
            Some(AdminCommand::AddYear {
                department,
                semester,
                year,
            })
        }
        "/uploadpaper" => {
            let (department, semester, year, name) = split_segments3_rest(rest)?;
            Some(AdminCommand::UploadPaper {
                department,
                semester,
                year,
                name,
            })
        }
        "/removepaper" => {
            let (department, semester, year, name) = split_segments3_rest(rest)?;
            Some(AdminCommand::RemovePaper {
                department,
                semester,
                year,
                name,
            })
        }
        "/prunedept" => (!rest.is_empty()).then(|| AdminCommand::Prune {
            department: rest.to_string(),
            semester: None,
            year: None,
        }),
        "/prunesem" => {
            let (department, semester) = split_segments2(rest)?;
            Some(AdminCommand::Prune {
                department,
                semester: Some(semester),
                year: None,
            })
        }
        "/pruneyear" => {
            let (department, semester, year) = split_segments3(rest)?;
            Some(AdminCommand::Prune {
                department,
                semester: Some(semester),
                year: Some(year),
            })
        }
        "/setprice" => {
            let (id, price) = split_segments2(rest)?;
            Some(AdminCommand::SetPrice {
                paper_id: id.parse().ok()?,
                price: price.parse().ok()?,
            })
        }
        "/notifyall" => (!rest.is_empty()).then(|| AdminCommand::NotifyAll {
            text: rest.to_string(),
        }),
        _ => None,
    }
}

fn split_segments2(rest: &str) -> Option<(String, String)> {
    let mut parts = rest.split_whitespace();
    let a = parts.next()?.to_string();
    let b = parts.next()?.to_string();
    parts.next().is_none().then_some((a, b))
}

fn split_segments3(rest: &str) -> Option<(String, String, String)> {
    let mut parts = rest.split_whitespace();
    let a = parts.next()?.to_string();
    let b = parts.next()?.to_string();
    let c = parts.next()?.to_string();
    parts.next().is_none().then_some((a, b, c))
}

fn split_segments3_rest(rest: &str) -> Option<(String, String, String, String)> {
    let mut parts = rest.splitn(4, ' ').filter(|s| !s.is_empty());
    let a = parts.next()?.to_string();
    let b = parts.next()?.to_string();
    let c = parts.next()?.to_string();
    let name = parts.next()?.trim().to_string();
    (!name.is_empty()).then_some((a, b, c, name))
}

fn user_message_for_api_error(err: ApiError) -> String {
    match err {
        ApiError::Network(_) => "The server is unreachable. Try again later!".to_string(),
        ApiError::Server { status, message } => match status {
            StatusCode::UNAUTHORIZED => "The bot is not authorized with the server.".to_string(),
            StatusCode::NOT_FOUND => "Not found. It may have been removed.".to_string(),
            StatusCode::CONFLICT
            | StatusCode::UNPROCESSABLE_ENTITY
            | StatusCode::BAD_REQUEST => message,
            _ => "Server error.".to_string(),
        },
    }
}

fn help_text() -> &'static str {
    "Browse past papers with the buttons, pay with Telegram Stars.\n\n/start or /home shows the main menu.\n/profile (or /history) shows your balance and papers.\n/about tells you what this is.\nBuying a whole year at once gets a 10% discount."
}

fn admin_help_text() -> &'static str {
    "Admin commands:\n/adddept <dept>\n/addsem <dept> <sem>\n/addyear <dept> <sem> <year>\n/uploadpaper <dept> <sem> <year> <name> (then send the file)\n/removepaper <dept> <sem> <year> <name>\n/prunedept <dept>\n/prunesem <dept> <sem>\n/pruneyear <dept> <sem> <year>\n/setprice <paper id> <price>\n/notifyall <text>"
}

#[derive(Debug, Clone)]
enum Command {
    Start,
    Home,
    Profile,
    About,
    Help,
}

#[derive(Debug, Clone)]
enum AdminCommand {
    AddDepartment {
        department: String,
    },
    AddSemester {
        department: String,
        semester: String,
    },
    AddYear {
        department: String,
        semester: String,
        year: String,
    },
    UploadPaper {
        department: String,
        semester: String,
        year: String,
        name: String,
    },
    RemovePaper {
        department: String,
        semester: String,
        year: String,
        name: String,
    },
    Prune {
        department: String,
        semester: Option<String>,
        year: Option<String>,
    },
    SetPrice {
        paper_id: i64,
        price: i64,
    },
    NotifyAll {
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_command_keeps_spaces_in_paper_names() {
        let cmd = parse_admin_command("/uploadpaper CSE Sem3 2023 Maths Mid Sem").unwrap();
        let AdminCommand::UploadPaper { name, .. } = cmd else {
            panic!("wrong command");
        };
        assert_eq!(name, "Maths Mid Sem");
    }

    #[test]
    fn admin_command_rejects_missing_segments() {
        assert!(parse_admin_command("/addyear CSE Sem3").is_none());
        assert!(parse_admin_command("/setprice twelve 5").is_none());
        assert!(parse_admin_command("hello").is_none());
    }

    #[test]
    fn user_commands_parse() {
        assert!(matches!(parse_command("/start"), Some(Command::Start)));
        assert!(matches!(parse_command("/history"), Some(Command::Profile)));
        assert!(matches!(parse_command("/about"), Some(Command::About)));
        assert!(matches!(parse_command("/help"), Some(Command::Help)));
        assert!(parse_command("12.50 coffee").is_none());
    }

    #[test]
    fn invoice_amounts_clamp_into_provider_range() {
        assert_eq!(stars_price(25), 25);
        assert_eq!(stars_price(i64::MAX), u32::MAX);
    }

    #[test]
    fn channel_links_drop_the_at_prefix() {
        assert_eq!(channel_url("@papers"), "https://t.me/papers");
        assert_eq!(channel_url("papers"), "https://t.me/papers");
    }
}
