//! # Sample Receipts
//!
//! A store receipt laid out for the model's paper width, built from
//! primitives so it exercises every text attribute plus a barcode and a QR
//! code. Used by the `sample` command to check a printer end to end.
//!
//! Columns are counted in font A cells (12 dots), so a 2-inch roll gets 32
//! characters per line, 3-inch 48, 4-inch 69. Kanji and kana take two cells.
//!
//! | Language | Charset | Content |
//! |----------|---------|---------|
//! | English | PC437 | clothing store sale with Code39 and QR |
//! | Japanese | Shift_JIS | 領収書 with yen amounts and 5% tax |
//! | Traditional Chinese | Big5 | e-invoice proof with Code39 and QR |

use chrono::{Datelike, NaiveDateTime};

use crate::job::{PrintPrimitive, TrailingAction};
use crate::printer::{CorrectionLevel, Limits, WidthClass};
use crate::protocol::barcode::Symbology;
use crate::protocol::text::{Alignment, DoubleByteCharset, FormattingState};

/// Font A cell width in dots
const CELL_DOTS: u16 = 12;

const ITEMS: &[(&str, &str, &str)] = &[
    ("300678566", "PLAIN T-SHIRT", "10.99"),
    ("300692003", "BLACK DENIM", "29.99"),
    ("300651148", "BLUE DENIM", "29.99"),
    ("300642980", "STRIPED DRESS", "49.99"),
    ("300638471", "BLACK BOOTS", "35.99"),
];

const TOTAL: &str = "156.95";

const ITEMS_JP: &[(&str, u32)] = &[
    ("ワンピース", 10_000),
    ("ブラウス", 3_800),
    ("Tシャツ", 2_000),
    ("ジャケット", 15_000),
    ("スカーフ", 5_000),
];

/// Consumption tax, percent
const TAX_RATE_JP: u32 = 5;

const ITEMS_CHT: &[(&str, u32)] = &[
    ("熱拿鐵", 130),
    ("蔬菜三明治", 85),
    ("巧克力蛋糕", 120),
];

const CASH_CHT: u32 = 500;

const INVOICE_CHT: &str = "EV-99999999";

/// Receipt language, which also picks the charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Japanese,
    TraditionalChinese,
}

/// The sample receipt in `language`.
pub fn sample(language: Language, limits: &Limits, now: NaiveDateTime) -> Vec<PrintPrimitive> {
    match language {
        Language::English => sample_receipt(limits, now),
        Language::Japanese => sample_receipt_jp(limits, now),
        Language::TraditionalChinese => sample_receipt_cht(limits, now),
    }
}

/// Characters per line in font A.
pub fn columns(limits: &Limits) -> usize {
    (limits.max_dot_width / CELL_DOTS) as usize
}

/// Printed width in cells: one for ASCII, two for everything else.
pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

/// `left` and `right` pushed to opposite edges of a `width`-column line.
fn spread(left: &str, right: &str, width: usize) -> String {
    let gap = width
        .saturating_sub(display_width(left) + display_width(right))
        .max(1);
    format!("{left}{}{right}", " ".repeat(gap))
}

/// `label` centred in a line of `fill`.
fn banner(label: &str, fill: char, width: usize) -> String {
    let pad = width.saturating_sub(display_width(label));
    let left = pad / 2;
    format!(
        "{}{label}{}",
        fill.to_string().repeat(left),
        fill.to_string().repeat(pad - left)
    )
}

/// The sample receipt for `limits`, dated `now`.
pub fn sample_receipt(limits: &Limits, now: NaiveDateTime) -> Vec<PrintPrimitive> {
    let width = columns(limits);
    let plain = FormattingState::new();
    let center = plain.center();
    let rule = "-".repeat(width);
    let line = |s: String| PrintPrimitive::text(s, plain);

    let mut out = vec![
        PrintPrimitive::text("Star Clothing Boutique", center.emphasized(true)),
        PrintPrimitive::text("123 Star Road", center),
        PrintPrimitive::text("City, State 12345", center),
        PrintPrimitive::text("", plain),
        line(spread(
            &now.format("Date: %m/%d/%Y").to_string(),
            &now.format("Time: %I:%M %p").to_string(),
            width,
        )),
        line(rule.clone()),
        PrintPrimitive::text("SALE", plain.emphasized(true)),
    ];

    out.extend(
        ITEMS
            .iter()
            .map(|(sku, name, price)| line(spread(&format!("{sku}  {name}"), price, width))),
    );

    out.extend([
        PrintPrimitive::text("", plain),
        line(spread("Subtotal", TOTAL, width)),
        line(spread("Tax", "0.00", width)),
        line(rule.clone()),
        line("Total".to_string()),
        PrintPrimitive::text(
            format!("${TOTAL}"),
            plain.scale(2, 2).alignment(Alignment::Right),
        ),
        line(rule.clone()),
        line("Charge".to_string()),
        line(format!("${TOTAL}")),
        line("Visa XXXX-XXXX-XXXX-0123".to_string()),
        PrintPrimitive::Barcode {
            symbology: Symbology::Code39,
            height: 100,
            width: WidthClass::W375,
            payload: b"12345678901".to_vec(),
        },
        PrintPrimitive::text("", plain),
        PrintPrimitive::text("Refunds and Exchanges", plain.invert(true)),
        PrintPrimitive::text("Within 30 days with receipt", plain.underline(true)),
        line("And tags attached".to_string()),
        line(banner("Sign Here", '-', width)),
        PrintPrimitive::text("", plain),
        PrintPrimitive::text("", plain),
        line(rule),
        PrintPrimitive::text("Thank you for buying Star!", center),
        PrintPrimitive::text("Scan QR code to visit our site!", center),
        PrintPrimitive::QrCode {
            correction_level: CorrectionLevel::Q,
            module_size: 4,
            size_by_ec_level: 0,
            payload: b"http://www.StarMicronics.com".to_vec(),
        },
    ]);
    out
}

/// `1234567` as `1,234,567`.
fn grouped(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Two-month e-invoice period in ROC years, e.g. `115年01-02月`.
fn invoice_period(now: NaiveDateTime) -> String {
    let start = (now.month() - 1) / 2 * 2 + 1;
    format!("{}年{:02}-{:02}月", now.year() - 1911, start, start + 1)
}

/// Japanese receipt, printed in Shift_JIS kanji mode.
pub fn sample_receipt_jp(limits: &Limits, now: NaiveDateTime) -> Vec<PrintPrimitive> {
    let width = columns(limits);
    let plain = FormattingState::new();
    let jp = |s: String, format: FormattingState| PrintPrimitive::DoubleByteText {
        content: s,
        charset: DoubleByteCharset::ShiftJis,
        format,
    };
    let line = |s: String| jp(s, plain);
    let rule = "-".repeat(width);

    let subtotal: u32 = ITEMS_JP.iter().map(|(_, price)| price).sum();
    let tax = subtotal * TAX_RATE_JP / 100;
    let yen = |amount: u32| format!("{}円", grouped(amount));

    let mut out = vec![
        jp("スター電機".to_string(), plain.center().emphasized(true).scale(2, 2)),
        jp("領収書".to_string(), plain.center().emphasized(true).scale(2, 1)),
        PrintPrimitive::text(rule.clone(), plain),
        line(now.format("日時:%Y年%m月%d日 %H時%M分").to_string()),
        PrintPrimitive::text("TEL:054-347-XXXX", plain),
        PrintPrimitive::text("", plain),
    ];
    out.extend(
        ITEMS_JP
            .iter()
            .map(|(name, price)| line(spread(name, &yen(*price), width))),
    );
    out.extend([
        PrintPrimitive::text(rule.clone(), plain),
        line(spread("小計", &yen(subtotal), width)),
        line(spread(&format!("消費税({TAX_RATE_JP}%)"), &yen(tax), width)),
        jp(
            spread("合計", &yen(subtotal + tax), width),
            plain.emphasized(true),
        ),
        PrintPrimitive::text("", plain),
        line("お問合せ 054-347-XXXX".to_string()),
        PrintPrimitive::text(rule, plain),
    ]);
    out
}

/// Traditional Chinese e-invoice proof, printed in Big5.
pub fn sample_receipt_cht(limits: &Limits, now: NaiveDateTime) -> Vec<PrintPrimitive> {
    let width = columns(limits);
    let plain = FormattingState::new();
    let cht = |s: String, format: FormattingState| PrintPrimitive::DoubleByteText {
        content: s,
        charset: DoubleByteCharset::Big5,
        format,
    };
    let line = |s: String| cht(s, plain);
    let rule = "-".repeat(width);
    let barcode = || PrintPrimitive::Barcode {
        symbology: Symbology::Code39,
        height: 100,
        width: WidthClass::W375,
        payload: b"99999997899".to_vec(),
    };

    let total: u32 = ITEMS_CHT.iter().map(|(_, price)| price).sum();
    let title = plain.center().emphasized(true).scale(2, 2);

    let mut out = vec![
        cht("星精密商店".to_string(), title),
        PrintPrimitive::text(rule.clone(), plain),
        cht("電子發票證明聯".to_string(), title),
        cht(invoice_period(now), title),
        PrintPrimitive::text(INVOICE_CHT, title),
        PrintPrimitive::text(now.format("%Y-%m-%d %H:%M:%S").to_string(), plain),
        line(spread("隨機碼:9999", &format!("總計:{total}"), width)),
        line("賣方:99999999".to_string()),
        barcode(),
        PrintPrimitive::text("", plain),
        PrintPrimitive::QrCode {
            correction_level: CorrectionLevel::Q,
            module_size: 6,
            size_by_ec_level: 0,
            payload: b"http://www.star-m.jp/eng/index.html".to_vec(),
        },
        PrintPrimitive::text("", plain),
        cht("銷售明細表".to_string(), plain.center()),
        PrintPrimitive::text(now.format("%Y-%m-%d %H:%M").to_string(), plain.right()),
    ];
    out.extend(
        ITEMS_CHT
            .iter()
            .map(|(name, price)| line(spread(name, &price.to_string(), width))),
    );
    out.extend([
        cht(spread("小計", &total.to_string(), width), plain.emphasized(true)),
        cht(spread("總計", &total.to_string(), width), plain.emphasized(true)),
        PrintPrimitive::text(rule, plain),
        line(spread("現金", &CASH_CHT.to_string(), width)),
        line(spread("找零", &(CASH_CHT - total).to_string(), width)),
        cht(format!("發票號碼 {INVOICE_CHT}"), plain.emphasized(true)),
        barcode(),
        PrintPrimitive::text("", plain),
        line("退換貨請持本發票證明聯".to_string()),
        line("客服專線 02-2999-XXXX".to_string()),
    ]);
    out
}

/// Feed the receipt clear of the tear bar, and cut where there is a cutter.
pub fn sample_trailing(limits: &Limits) -> Vec<TrailingAction> {
    let mut out = vec![TrailingAction::Feed { lines: 3 }];
    if limits.has_cutter {
        out.push(TrailingAction::Cut { partial: true });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::compose;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 20)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn texts(prims: &[PrintPrimitive]) -> Vec<String> {
        prims
            .iter()
            .filter_map(|p| match p {
                PrintPrimitive::Text { content, .. } => {
                    Some(String::from_utf8_lossy(content).into_owned())
                }
                _ => None,
            })
            .collect()
    }

    const LANGUAGES: [Language; 3] = [
        Language::English,
        Language::Japanese,
        Language::TraditionalChinese,
    ];

    /// Printed cells of every text primitive, scale included.
    fn widths(prims: &[PrintPrimitive]) -> Vec<(String, usize)> {
        prims
            .iter()
            .filter_map(|p| match p {
                PrintPrimitive::Text { content, format } => {
                    let text = String::from_utf8_lossy(content).into_owned();
                    let cells = text.len() * format.width_scale as usize;
                    Some((text, cells))
                }
                PrintPrimitive::DoubleByteText {
                    content, format, ..
                } => Some((
                    content.clone(),
                    display_width(content) * format.width_scale as usize,
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_columns_per_width() {
        assert_eq!(columns(&Limits::PORTABLE_2INCH), 32);
        assert_eq!(columns(&Limits::PORTABLE_3INCH), 48);
        assert_eq!(columns(&Limits::PORTABLE_4INCH), 69);
    }

    #[test]
    fn test_spread_and_banner() {
        assert_eq!(spread("Tax", "0.00", 12), "Tax     0.00");
        assert_eq!(spread("overflowing", "9.99", 8), "overflowing 9.99");
        assert_eq!(banner("Sign", '-', 10), "---Sign---");
    }

    #[test]
    fn test_lines_fit_width() {
        for limits in [Limits::PORTABLE_2INCH, Limits::PORTABLE_3INCH, Limits::PORTABLE_4INCH] {
            let width = columns(&limits);
            for text in texts(&sample_receipt(&limits, noon())) {
                assert!(text.len() <= width, "{text:?} wider than {width}");
            }
        }
    }

    #[test]
    fn test_localized_lines_fit_width() {
        for language in LANGUAGES {
            for limits in [Limits::PORTABLE_2INCH, Limits::PORTABLE_3INCH, Limits::PORTABLE_4INCH] {
                let width = columns(&limits);
                for (text, cells) in widths(&sample(language, &limits, noon())) {
                    assert!(cells <= width, "{language:?}: {text:?} takes {cells} of {width}");
                }
            }
        }
    }

    #[test]
    fn test_localized_receipts_use_their_charset() {
        let charsets = |prims: &[PrintPrimitive]| -> Vec<DoubleByteCharset> {
            prims
                .iter()
                .filter_map(|p| match p {
                    PrintPrimitive::DoubleByteText { charset, .. } => Some(*charset),
                    _ => None,
                })
                .collect()
        };
        let limits = Limits::PORTABLE_2INCH;
        let jp = charsets(&sample_receipt_jp(&limits, noon()));
        let cht = charsets(&sample_receipt_cht(&limits, noon()));
        assert!(!jp.is_empty() && jp.iter().all(|c| *c == DoubleByteCharset::ShiftJis));
        assert!(!cht.is_empty() && cht.iter().all(|c| *c == DoubleByteCharset::Big5));
        assert!(charsets(&sample(Language::English, &limits, noon())).is_empty());
    }

    #[test]
    fn test_invoice_period() {
        assert_eq!(invoice_period(noon()), "115年01-02月");
        let june = NaiveDate::from_ymd_opt(2026, 6, 30)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();
        assert_eq!(invoice_period(june), "115年05-06月");
    }

    #[test]
    fn test_jp_totals_and_date() {
        let prims = sample_receipt_jp(&Limits::PORTABLE_2INCH, noon());
        let lines: Vec<String> = prims
            .iter()
            .filter_map(|p| match p {
                PrintPrimitive::DoubleByteText { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect();
        assert!(lines.contains(&"日時:2026年01月20日 12時00分".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("小計") && l.ends_with("35,800円")));
        assert!(lines.iter().any(|l| l.starts_with("合計") && l.ends_with("37,590円")));
    }

    #[test]
    fn test_grouped_and_display_width() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(999), "999");
        assert_eq!(grouped(35_800), "35,800");
        assert_eq!(grouped(1_234_567), "1,234,567");
        assert_eq!(display_width("Tシャツ"), 7);
        assert_eq!(spread("小計", "1円", 10), "小計   1円");
    }

    #[test]
    fn test_date_line() {
        let lines = texts(&sample_receipt(&Limits::PORTABLE_2INCH, noon()));
        assert_eq!(lines[4], "Date: 01/20/2026  Time: 12:00 PM");
    }

    #[test]
    fn test_composes_for_every_model() {
        for language in LANGUAGES {
            for limits in [
                Limits::PORTABLE_2INCH,
                Limits::PORTABLE_3INCH,
                Limits::PORTABLE_4INCH,
                Limits::POS_80,
            ] {
                let job = compose(
                    &sample(language, &limits, noon()),
                    &sample_trailing(&limits),
                    &limits,
                )
                .unwrap();
                assert!(job.len() > 300, "{language:?} on {}", limits.name);
            }
        }
    }

    #[test]
    fn test_cut_only_with_cutter() {
        assert_eq!(sample_trailing(&Limits::PORTABLE_3INCH).len(), 1);
        assert_eq!(
            sample_trailing(&Limits::POS_80).last(),
            Some(&TrailingAction::Cut { partial: true })
        );
    }
}
