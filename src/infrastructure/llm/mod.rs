mod yandex;

pub use yandex::YandexGpt;
