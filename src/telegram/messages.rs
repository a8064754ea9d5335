//! User-visible bot replies, collected in one place.

pub const GREETING: &str =
    "Привет! Напиши, что нужно сделать (например «купить хлеб и позвонить маме завтра»), \
     или отправь голосовое сообщение. /remind настроит напоминание.";

pub const CANCELLED: &str = "Отменил текущую операцию.";
pub const INVALID_QUERY: &str =
    "Не смог обработать нажатие. Попробуй ещё раз или отправь /cancel.";

pub const TASKS_HEADER: &str = "📝 Задачи:";
pub const NO_TASKS_FOUND: &str = "Не смог найти задачи 🤷";
pub const TASK_LIST_EMPTY: &str = "У тебя пока нет задач.";
pub const TASK_DELETED: &str = "Задача удалена";
pub const NO_DUE_DATE: &str = "без даты";

pub const REMIND_NO_TASKS: &str = "Сначала добавь задачу, потом настроим напоминание.";
pub const REMIND_CHOOSE_TASK: &str = "Выбери задачу для напоминания:";
pub const REMIND_ASK_TIME: &str =
    "Во сколько напомнить? Отправь время в формате ЧЧ:ММ, например 09:30.";
pub const REMIND_BAD_TIME: &str = "Не понял время. Нужен формат ЧЧ:ММ, например 09:30.";
pub const REMIND_LIST_HEADER: &str = "⏰ Твои напоминания:";
pub const REMIND_LIST_EMPTY: &str = "Активных напоминаний нет.";
pub const REMIND_DELETED: &str = "Напоминание удалено";
pub const TASK_TITLE_MISSING: &str = "(задача удалена)";

pub const VOICE_PROCESSING: &str = "🎧 Распознаю голос...";
pub const VOICE_CONFIRM_BUTTON: &str = "Создать задачи";
pub const VOICE_EXPIRED: &str = "Расшифровка устарела, отправь голосовое ещё раз.";
pub const VOICE_FAILED: &str = "Не получилось распознать голос, попробуй ещё раз.";
