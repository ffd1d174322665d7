//! Localized display strings.
//!
//! [`Locales`] is an explicitly constructed lookup object passed into the
//! dialog engine and handlers at startup — there is no ambient global
//! table. The core only ever passes keys; rendering text is resolved here.
//!
//! Resolution order: requested language → default language → the key
//! itself, so a missing translation degrades visibly instead of panicking.

use std::collections::HashMap;

/// Language-keyed message tables.
#[derive(Debug)]
pub struct Locales {
    tables: HashMap<String, HashMap<&'static str, &'static str>>,
    default_lang: String,
}

impl Locales {
    /// Build the built-in `ru` / `ky` tables with the given default language.
    ///
    /// An unknown `default_lang` is accepted but resolves keys to
    /// themselves, which shows up immediately in manual testing.
    pub fn builtin(default_lang: &str) -> Self {
        let mut tables = HashMap::new();
        tables.insert("ru".to_owned(), RU.iter().copied().collect());
        tables.insert("ky".to_owned(), KY.iter().copied().collect());
        Self {
            tables,
            default_lang: default_lang.to_owned(),
        }
    }

    /// The configured default language tag.
    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Whether `lang` has a message table. Language preferences are a
    /// closed set; tags outside it must not be persisted.
    pub fn supported(&self, lang: &str) -> bool {
        self.tables.contains_key(lang)
    }

    /// Resolve `key` for `lang`, falling back to the default language and
    /// finally to the raw key.
    pub fn resolve<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        if let Some(text) = self.tables.get(lang).and_then(|t| t.get(key)) {
            return text;
        }
        if let Some(text) = self.tables.get(&self.default_lang).and_then(|t| t.get(key)) {
            return text;
        }
        key
    }
}

const RU: &[(&str, &str)] = &[
    ("language.prompt", "Выберите язык / Тилди тандаңыз"),
    ("language.saved", "Язык сохранён"),
    ("menu.prompt", "Что делаем?"),
    ("menu.create", "🚗 Создать поездку"),
    ("menu.search", "🔍 Найти поездку"),
    ("menu.mytrips", "📋 Мои поездки"),
    ("driver.from_city", "Откуда поедете?"),
    ("driver.to_city", "Куда?"),
    ("driver.date", "Когда? Выберите дату или введите в формате ГГГГ-ММ-ДД"),
    ("driver.time", "Во сколько выезд? Введите ЧЧ:ММ или пропустите"),
    ("driver.invalid_time", "Неверное время. Формат: ЧЧ:ММ"),
    ("driver.seats", "Сколько свободных мест?"),
    ("driver.price", "Цена за место?"),
    ("driver.car", "Какая машина? Можно пропустить"),
    ("driver.photos", "Пришлите до 3 фото машины или пропустите"),
    ("driver.phone", "Номер телефона для связи"),
    ("driver.invalid_phone", "Неверный формат телефона"),
    ("driver.comment", "Комментарий? Можно пропустить"),
    ("driver.confirm", "Проверьте объявление:"),
    ("driver.created", "Поездка создана ✅"),
    ("passenger.from_city", "Откуда едем?"),
    ("passenger.to_city", "Куда едем?"),
    ("passenger.date", "На какую дату?"),
    ("passenger.time", "В какое время суток?"),
    ("passenger.no_results", "😔 Ничего не нашлось"),
    ("followup.message", "Пассажир получил ваш номер. Поездка ещё актуальна?"),
    ("followup.full", "Мест нет"),
    ("followup.not_yet", "Пока актуальна"),
    ("followup.delete", "Удалить объявление"),
    ("mytrips.empty", "У вас нет объявлений"),
    ("mytrips.delete", "🗑 Удалить"),
    ("card.seats", "мест"),
    ("card.phone_button", "📞 Показать номер"),
    ("common.skip", "Пропустить"),
    ("common.negotiable", "Договорная"),
    ("common.today", "Сегодня"),
    ("common.tomorrow", "Завтра"),
    ("common.manual_date", "Ввести дату"),
    ("common.enter_date", "Введите дату в формате ГГГГ-ММ-ДД"),
    ("common.invalid_date", "Неверная дата. Формат: ГГГГ-ММ-ДД"),
    ("common.confirm", "Подтвердить ✅"),
    ("common.cancel", "Отмена"),
    ("common.cancelled", "Отменено"),
    ("common.not_found", "Объявление не найдено"),
    ("common.error", "Что-то пошло не так, попробуйте ещё раз"),
];

const KY: &[(&str, &str)] = &[
    ("language.prompt", "Выберите язык / Тилди тандаңыз"),
    ("language.saved", "Тил сакталды"),
    ("menu.prompt", "Эмне кылабыз?"),
    ("menu.create", "🚗 Сапар түзүү"),
    ("menu.search", "🔍 Сапар издөө"),
    ("menu.mytrips", "📋 Менин сапарларым"),
    ("driver.from_city", "Кайдан чыгасыз?"),
    ("driver.to_city", "Кайда барасыз?"),
    (
        "driver.date",
        "Качан? Күндү тандаңыз же ЖЖЖЖ-АА-КК форматында жазыңыз",
    ),
    (
        "driver.time",
        "Саат канчада? СС:ММ форматында жазыңыз же өткөрүп жибериңиз",
    ),
    ("driver.invalid_time", "Убакыт туура эмес. Формат: СС:ММ"),
    ("driver.seats", "Канча бош орун бар?"),
    ("driver.price", "Бир орундун баасы?"),
    ("driver.car", "Кайсы машина? Өткөрүп жиберсе болот"),
    (
        "driver.photos",
        "Машинанын 3кө чейин сүрөтүн жөнөтүңүз же өткөрүп жибериңиз",
    ),
    ("driver.phone", "Байланыш үчүн телефон номери"),
    ("driver.invalid_phone", "Телефон номери туура эмес"),
    ("driver.comment", "Комментарий? Өткөрүп жиберсе болот"),
    ("driver.confirm", "Жарыяны текшериңиз:"),
    ("driver.created", "Сапар түзүлдү ✅"),
    ("passenger.from_city", "Кайдан жөнөйбүз?"),
    ("passenger.to_city", "Кайда барабыз?"),
    ("passenger.date", "Кайсы күнгө?"),
    ("passenger.time", "Күндүн кайсы убагында?"),
    ("passenger.no_results", "😔 Эч нерсе табылган жок"),
    (
        "followup.message",
        "Жүргүнчү номериңизди алды. Сапар дагы актуалдуубу?",
    ),
    ("followup.full", "Орун жок"),
    ("followup.not_yet", "Азырынча актуалдуу"),
    ("followup.delete", "Жарыяны өчүрүү"),
    ("mytrips.empty", "Сизде жарыялар жок"),
    ("mytrips.delete", "🗑 Өчүрүү"),
    ("card.seats", "орун"),
    ("card.phone_button", "📞 Номерди көрсөтүү"),
    ("common.skip", "Өткөрүп жиберүү"),
    ("common.negotiable", "Келишим баада"),
    ("common.today", "Бүгүн"),
    ("common.tomorrow", "Эртең"),
    ("common.manual_date", "Күндү жазуу"),
    ("common.enter_date", "Күндү ЖЖЖЖ-АА-КК форматында жазыңыз"),
    ("common.invalid_date", "Күн туура эмес. Формат: ЖЖЖЖ-АА-КК"),
    ("common.confirm", "Ырастоо ✅"),
    ("common.cancel", "Жокко чыгаруу"),
    ("common.cancelled", "Жокко чыгарылды"),
    ("common.not_found", "Жарыя табылган жок"),
    ("common.error", "Бир нерсе туура эмес болду, кайра аракет кылыңыз"),
];
