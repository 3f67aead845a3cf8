mod yandex;

pub use yandex::YandexEmbedding;
