
mod vehicles;
